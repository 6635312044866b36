use crate::account::Accounts;
use crate::action::Actions;
use crate::config::ClientConfig;
use crate::dev::DevUtils;
use crate::error::ClientResult;
use crate::feed::Feeds;
use crate::flavor::Flavors;
use crate::index::Indexes;
use crate::key::Keys;
use crate::session::Session;
use crate::stats::StatsModule;
use crate::token::Tokens;
use crate::transaction::Transactions;

/// Entry point for all ledger interaction: one credential bound to one
/// ledger.
///
/// Cheap to share: every resource accessor borrows the same underlying
/// session, and the session's transport multiplexes all one-shot
/// traffic. Feeds get their own connections when consumed.
pub struct Client {
    session: Session,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl Client {
    /// Set up a ledger client. Validates the configuration locally;
    /// routing is discovered on first use.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        Ok(Self {
            session: Session::new(config),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn accounts(&self) -> Accounts<'_> {
        Accounts::new(&self.session)
    }

    pub fn actions(&self) -> Actions<'_> {
        Actions::new(&self.session)
    }

    pub fn feeds(&self) -> Feeds<'_> {
        Feeds::new(&self.session)
    }

    pub fn flavors(&self) -> Flavors<'_> {
        Flavors::new(&self.session)
    }

    pub fn indexes(&self) -> Indexes<'_> {
        Indexes::new(&self.session)
    }

    pub fn keys(&self) -> Keys<'_> {
        Keys::new(&self.session)
    }

    pub fn stats(&self) -> StatsModule<'_> {
        StatsModule::new(&self.session)
    }

    pub fn tokens(&self) -> Tokens<'_> {
        Tokens::new(&self.session)
    }

    pub fn transactions(&self) -> Transactions<'_> {
        Transactions::new(&self.session)
    }

    pub fn dev(&self) -> DevUtils<'_> {
        DevUtils::new(&self.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    #[test]
    fn blank_config_is_rejected_at_construction() {
        let err = Client::new(ClientConfig::new("", "cred")).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        let err = Client::new(ClientConfig::new("main", "")).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn valid_config_builds() {
        assert!(Client::new(ClientConfig::new("main", "cred")).is_ok());
    }
}
