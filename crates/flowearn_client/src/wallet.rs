use ethers::types::Address;
use log::info;

use crate::error::ActionError;

/// A connected account and the writer that signs on its behalf
#[derive(Debug)]
pub struct WalletSession<W> {
    pub account: Address,
    pub writer: W,
}

/// The active account, passed explicitly to anything that writes to the ledger
#[derive(Debug)]
pub struct WalletContext<W> {
    session: Option<WalletSession<W>>,
}

impl<W> WalletContext<W> {
    pub fn disconnected() -> Self {
        WalletContext { session: None }
    }

    pub fn connected(account: Address, writer: W) -> Self {
        let mut ctx = Self::disconnected();
        ctx.connect(account, writer);
        ctx
    }

    pub fn connect(&mut self, account: Address, writer: W) {
        info!("Wallet connected as {account:?}");
        self.session = Some(WalletSession { account, writer });
    }

    pub fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            info!("Wallet {:?} disconnected", session.account);
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.session.as_ref().map(|session| session.account)
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Session to write with, or the error asking the user to connect
    pub fn session(&self) -> Result<&WalletSession<W>, ActionError> {
        self.session.as_ref().ok_or(ActionError::NotConnected)
    }
}
