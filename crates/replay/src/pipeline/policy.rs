//! Deciding whether a decrypted query has a terminal replay.

use common::protocol::CapturedQuery;

/// Classifies a decrypted query body as replayable or not.
///
/// Applied only to encrypted records, whose exported `replayable` flag cannot
/// be trusted until the body has been read. Any `Fn(&CapturedQuery) -> bool`
/// closure is also a policy.
pub trait ReplayPolicy: Send + Sync {
    fn is_replayable(&self, query: &CapturedQuery) -> bool;
}

/// Interactive shell sessions are replayable; everything else is a command.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellPolicy;

impl ReplayPolicy for ShellPolicy {
    fn is_replayable(&self, query: &CapturedQuery) -> bool {
        query.kind.as_deref() == Some("shell")
    }
}

impl<F> ReplayPolicy for F
where
    F: Fn(&CapturedQuery) -> bool + Send + Sync,
{
    fn is_replayable(&self, query: &CapturedQuery) -> bool {
        self(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(kind: Option<&str>) -> CapturedQuery {
        CapturedQuery {
            kind: kind.map(str::to_owned),
            command: None,
        }
    }

    #[test]
    fn shell_policy() {
        assert!(ShellPolicy.is_replayable(&query(Some("shell"))));
        assert!(!ShellPolicy.is_replayable(&query(Some("Shell"))));
        assert!(!ShellPolicy.is_replayable(&query(Some("exec"))));
        assert!(!ShellPolicy.is_replayable(&query(None)));
    }

    #[test]
    fn closure_policy() {
        let everything = |_: &CapturedQuery| true;
        assert!(everything.is_replayable(&query(None)));
    }
}
