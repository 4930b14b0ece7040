use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplorerError {
    /// Fatal to root-node computation; the display layer shows an error state.
    #[error("no workspace folder is open")]
    NoWorkspaceFolder,
    /// A structural query to the language server failed.
    #[error("project query failed")]
    Client(#[from] anyhow::Error),
}
