mod validate;

use anyhow::{Error, Result};
use itertools::Itertools;
use log::{debug, info};
use structopt::StructOpt;

use acctform::config::{self, Scope};
use acctform::{AccountRecord, AccountStore, FileBackend, RecordType, StorageAdapter};

#[derive(Debug, StructOpt)]
#[structopt(name = "acctform", about = "Manage local and LDAP account records")]
struct Opt {
    /// Use session scoped storage instead of the persistent file
    #[structopt(long)]
    session: bool,

    /// Persistent storage file, `~` and environment variables are expanded
    #[structopt(long)]
    storage: Option<String>,

    #[structopt(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, StructOpt)]
enum Cmd {
    /// Show all records
    List,
    /// Show the available record types
    Options,
    /// Append an empty record
    Add,
    /// Delete the record at index
    Remove { index: usize },
    /// Set the `;` separated labels of a record
    Label { index: usize, raw: String },
    Login { index: usize, login: String },
    /// Set the password, omit it to unset
    Password { index: usize, password: Option<String> },
    Type { index: usize, record_type: RecordType },
    /// Drop every stored entry
    Clear,
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let opt = Opt::from_args();
    let scope = if opt.session { Scope::Session } else { Scope::Persistent };
    let path = config::storage_path(scope, opt.storage.as_deref())?;
    debug!("Using {:?} storage at {:?}", scope, path);

    let mut storage = StorageAdapter::new(FileBackend::new(path));
    if let Cmd::Clear = opt.cmd {
        return if storage.clear() {
            Ok(())
        } else {
            Err(Error::msg("Unable to clear storage"))
        };
    }
    let mut store = AccountStore::new(storage);
    run(&mut store, opt.cmd)
}

fn run(store: &mut AccountStore<FileBackend>, cmd: Cmd) -> Result<()> {
    match cmd {
        Cmd::List => {
            for (i, record) in store.account_data().iter().enumerate() {
                println!("{}", describe(i, record));
            }
            Ok(())
        }
        Cmd::Options => {
            println!("{}", store.record_options().iter().join("\n"));
            Ok(())
        }
        Cmd::Add => {
            store.add_record();
            store.save_record();
            info!("Added record {}", store.account_data().len() - 1);
            Ok(())
        }
        Cmd::Remove { index } => {
            ensure_record(store, index)?;
            store.remove_record(index);
            Ok(())
        }
        Cmd::Label { index, raw } => edit(store, index, |r| {
            r.label = AccountStore::<FileBackend>::parse_label(&raw);
            r.label_raw = raw;
        }),
        Cmd::Login { index, login } => edit(store, index, |r| r.login = login),
        Cmd::Password { index, password } => edit(store, index, |r| r.password = password),
        Cmd::Type { index, record_type } => edit(store, index, |r| r.record_type = record_type),
        // Handled in main before loading
        Cmd::Clear => Ok(()),
    }
}

fn ensure_record(store: &AccountStore<FileBackend>, index: usize) -> Result<()> {
    if store.record(index).is_none() {
        return Err(Error::msg(format!(
            "No record at index {}, there are {}",
            index,
            store.account_data().len()
        )));
    }
    Ok(())
}

fn edit<F: FnOnce(&mut AccountRecord)>(
    store: &mut AccountStore<FileBackend>,
    index: usize,
    f: F,
) -> Result<()> {
    ensure_record(store, index)?;
    store.update_record(index, f);
    revalidate(store, index);
    if let Some(record) = store.record(index) {
        let flagged = record.errors.fields().join(", ");
        if !flagged.is_empty() {
            println!("Record {} has invalid fields: {}", index, flagged);
        }
    }
    store.save_record();
    Ok(())
}

fn revalidate(store: &mut AccountStore<FileBackend>, index: usize) {
    if let Some(errors) = store.record(index).map(validate::validate) {
        store.update_record(index, |r| r.errors = errors);
    }
}

fn describe(index: usize, record: &AccountRecord) -> String {
    let labels = record.label.iter().map(|l| &l.text).join("; ");
    let password = match &record.password {
        Some(p) => "*".repeat(p.chars().count()),
        None => "-".to_owned(),
    };
    let errors = if record.errors.has_errors() {
        format!(" [invalid: {}]", record.errors.fields().join(", "))
    } else {
        String::new()
    };
    format!(
        "{}: {} [{}] login={} password={}{}",
        index, record.record_type, labels, record.login, password, errors
    )
}
