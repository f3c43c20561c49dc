pub mod import_mechanism;

pub use import_mechanism::{
    ConfigService, DownloadClient, DownloadClientKind, DownloadClientProvider,
    DownloadClientStatus, ImportMechanismCheck,
};
