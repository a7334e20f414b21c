use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    errors::{LedgerError, Result},
    ledger::Account,
    utils::paths::{accounts_dir_in, ensure_dir, resolve_base},
};

use super::{due_rows, DueSet, LedgerStore, UnreadableAccount};

const ACCOUNT_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// Stores each account as its own JSON document under `<root>/accounts/`.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
    accounts_dir: PathBuf,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>) -> Result<Self> {
        let root = resolve_base(root);
        ensure_dir(&root)?;
        let accounts_dir = accounts_dir_in(&root);
        ensure_dir(&accounts_dir)?;
        Ok(Self { root, accounts_dir })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn account_path(&self, id: Uuid) -> PathBuf {
        self.accounts_dir
            .join(format!("{}.{}", id, ACCOUNT_EXTENSION))
    }

    fn account_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.accounts_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ACCOUNT_EXTENSION) {
                continue;
            }
            paths.push(path);
        }
        paths.sort();
        Ok(paths)
    }
}

impl LedgerStore for JsonStorage {
    fn find_due_schedules(&self, as_of: NaiveDate) -> Result<DueSet> {
        let mut due = DueSet::default();
        for path in self.account_paths()? {
            match load_account_from_path(&path) {
                Ok(account) => due.rows.extend(due_rows(&account, as_of)),
                Err(error) => match account_id_from_path(&path) {
                    Some(account_id) => {
                        warn!(
                            account_id = %account_id,
                            error = %error,
                            "Unreadable account document"
                        );
                        due.unreadable.push(UnreadableAccount { account_id, error });
                    }
                    None => {
                        warn!(
                            path = %path.display(),
                            error = %error,
                            "Ignoring document without an account id"
                        );
                    }
                },
            }
        }
        debug!(
            count = due.rows.len(),
            unreadable = due.unreadable.len(),
            %as_of,
            "Collected due schedules"
        );
        Ok(due)
    }

    fn load_account(&self, id: Uuid) -> Result<Account> {
        let path = self.account_path(id);
        if !path.exists() {
            return Err(LedgerError::AccountNotFound(id));
        }
        load_account_from_path(&path)
    }

    fn commit_account(&self, account: &Account) -> Result<()> {
        save_account_to_path(account, &self.account_path(account.id))
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        self.account_paths()?
            .iter()
            .map(|path| load_account_from_path(path))
            .collect()
    }
}

/// Writes the account next to its target and renames it into place, so readers
/// see either the previous document or the new one.
pub fn save_account_to_path(account: &Account, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(account)?;
    let tmp = tmp_path(path);
    if let Err(err) = write_file(&tmp, &json) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_account_from_path(path: &Path) -> Result<Account> {
    let data = fs::read_to_string(path)?;
    let account: Account = serde_json::from_str(&data)?;
    account.validate().map_err(|err| {
        LedgerError::StorageError(format!("{} is inconsistent: {}", path.display(), err))
    })?;
    Ok(account)
}

fn account_id_from_path(path: &Path) -> Option<Uuid> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| Uuid::parse_str(stem).ok())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_file(path: &Path, data: &str) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
