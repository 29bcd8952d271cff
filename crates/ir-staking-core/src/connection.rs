//! Session transitions. Pure functions over [`SessionState`]; the caller
//! publishes the result and carries out the returned effect.

use alloy_primitives::Address;
use ir_api_types::ConnectionState;
use ir_chain_client::{ProviderEvent, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    AccountChanged,
    ChainRestored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEffect {
    None,
    Refresh(RefreshReason),
    /// An account appeared while disconnected; the chain id must be read
    /// before the session counts as connected.
    SilentConnect(Address),
    /// The session ended; the view must be zeroed.
    Reset,
}

pub fn begin_connect(state: &SessionState) -> SessionState {
    SessionState {
        connection: ConnectionState::Connecting,
        ..state.clone()
    }
}

pub fn connected(account: Address, chain_id: u64, expected_chain_id: u64) -> SessionState {
    SessionState {
        connection: ConnectionState::Connected {
            chain_valid: chain_id == expected_chain_id,
        },
        account: Some(account),
        chain_id: Some(chain_id),
    }
}

pub fn apply_event(state: &SessionState, event: &ProviderEvent, expected_chain_id: u64) -> (SessionState, SessionEffect) {
    match event {
        ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
            None => (SessionState::default(), SessionEffect::Reset),
            Some(&account) if state.connection.is_connected() => {
                if state.account == Some(account) {
                    (state.clone(), SessionEffect::None)
                } else {
                    let next = SessionState {
                        account: Some(account),
                        ..state.clone()
                    };
                    (next, SessionEffect::Refresh(RefreshReason::AccountChanged))
                }
            }
            Some(&account) => (state.clone(), SessionEffect::SilentConnect(account)),
        },
        ProviderEvent::ChainChanged(chain_id) => {
            let chain_valid = *chain_id == expected_chain_id;
            match state.connection {
                ConnectionState::Connected { chain_valid: was_valid } => {
                    let next = SessionState {
                        connection: ConnectionState::Connected { chain_valid },
                        chain_id: Some(*chain_id),
                        ..state.clone()
                    };
                    let effect = if chain_valid && !was_valid {
                        SessionEffect::Refresh(RefreshReason::ChainRestored)
                    } else {
                        SessionEffect::None
                    };
                    (next, effect)
                }
                _ => (
                    SessionState {
                        chain_id: Some(*chain_id),
                        ..state.clone()
                    },
                    SessionEffect::None,
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED: u64 = 97;

    fn account(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn connect_validates_chain() {
        assert_eq!(
            connected(account(1), 97, EXPECTED).connection,
            ConnectionState::Connected { chain_valid: true }
        );
        assert_eq!(
            connected(account(1), 56, EXPECTED).connection,
            ConnectionState::Connected { chain_valid: false }
        );
        assert_eq!(
            begin_connect(&SessionState::default()).connection,
            ConnectionState::Connecting
        );
    }

    #[test]
    fn empty_accounts_disconnect() {
        let state = connected(account(1), 97, EXPECTED);
        let (next, effect) = apply_event(&state, &ProviderEvent::AccountsChanged(vec![]), EXPECTED);
        assert_eq!(next, SessionState::default());
        assert_eq!(effect, SessionEffect::Reset);
    }

    #[test]
    fn account_switch_replaces_account_and_refreshes() {
        let state = connected(account(1), 97, EXPECTED);
        let (next, effect) = apply_event(
            &state,
            &ProviderEvent::AccountsChanged(vec![account(2), account(3)]),
            EXPECTED,
        );
        assert_eq!(next.account, Some(account(2)));
        assert_eq!(next.chain_id, Some(97));
        assert_eq!(effect, SessionEffect::Refresh(RefreshReason::AccountChanged));

        let (same, effect) = apply_event(&next, &ProviderEvent::AccountsChanged(vec![account(2)]), EXPECTED);
        assert_eq!(same, next);
        assert_eq!(effect, SessionEffect::None);
    }

    #[test]
    fn account_while_disconnected_connects_silently() {
        let (next, effect) = apply_event(
            &SessionState::default(),
            &ProviderEvent::AccountsChanged(vec![account(4)]),
            EXPECTED,
        );
        assert_eq!(next, SessionState::default());
        assert_eq!(effect, SessionEffect::SilentConnect(account(4)));
    }

    #[test]
    fn returning_to_expected_chain_refreshes() {
        let wrong = connected(account(1), 56, EXPECTED);
        let (next, effect) = apply_event(&wrong, &ProviderEvent::ChainChanged(97), EXPECTED);
        assert_eq!(next.connection, ConnectionState::Connected { chain_valid: true });
        assert_eq!(next.chain_id, Some(97));
        assert_eq!(effect, SessionEffect::Refresh(RefreshReason::ChainRestored));
    }

    #[test]
    fn leaving_expected_chain_blocks_without_refresh() {
        let valid = connected(account(1), 97, EXPECTED);
        let (next, effect) = apply_event(&valid, &ProviderEvent::ChainChanged(1), EXPECTED);
        assert_eq!(next.connection, ConnectionState::Connected { chain_valid: false });
        assert!(!next.connection.can_transact());
        assert_eq!(effect, SessionEffect::None);
    }

    #[test]
    fn chain_change_while_disconnected_is_recorded() {
        let (next, effect) = apply_event(&SessionState::default(), &ProviderEvent::ChainChanged(97), EXPECTED);
        assert_eq!(next.connection, ConnectionState::Disconnected);
        assert_eq!(next.chain_id, Some(97));
        assert_eq!(effect, SessionEffect::None);
    }
}
