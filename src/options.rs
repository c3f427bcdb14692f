use std::{borrow::Cow, ffi::{OsStr, OsString}, path::{Path, PathBuf}};

use clap::{Parser, ValueEnum};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrintOnExit {
    Nothing,
    Receipt,
    Code,
}

#[derive(Parser, Debug)]
#[command(about = "Register market stall vendors")]
pub struct Options {
    /// Record store file. Default: $STALLREG_STORE, `stalls.json`.
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Stall type to pre-fill the form with.
    #[arg(long)]
    pub stall_type: Option<String>,

    /// Print next stall id and name for `--stall-type` and exit.
    #[arg(long, conflicts_with = "list")]
    pub next_numbers: bool,

    /// Print stored stalls and exit.
    #[arg(long)]
    pub list: bool,

    /// Decode a scanned registration code, print its fields and exit.
    #[arg(long, value_name = "CODE")]
    pub decode: Option<String>,

    /// Directory to write receipts of registered stalls to.
    #[arg(long)]
    pub receipt_dir: Option<PathBuf>,

    /// What to print on program exit.
    #[arg(long, default_value="nothing")]
    pub print_on_exit: PrintOnExit,

    /// Pager program to use. Default: $PAGER, `less`.
    #[arg(long)]
    pub pager: Option<OsString>,

    #[arg(long, requires="log_file")]
    pub logging: Option<String>,
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Options {
    pub fn resolve_store(&self) -> Cow<'_, Path> {
        self.store.as_deref()
            .map(Cow::from)
            .or_else(|| std::env::var_os("STALLREG_STORE").map(|p| Cow::from(PathBuf::from(p))))
            .unwrap_or(Cow::from(PathBuf::from("stalls.json")))
    }

    /// Stall type to scope name numbering to; blank means no scoping.
    pub fn type_filter(&self) -> Option<&str> {
        self.stall_type.as_deref()
            .map(str::trim)
            .filter(|stall_type| !stall_type.is_empty())
    }

    pub fn resolve_pager(&self) -> Cow<'_, OsStr> {
        self.pager.as_deref()
            .map(Cow::from)
            .or_else(|| std::env::var_os("PAGER").map(Cow::from))
            .unwrap_or(Cow::from(OsString::from("less")))
    }
}
