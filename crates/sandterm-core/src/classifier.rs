//! Decides which commands get the live stream view.

/// Predicate over submitted commands: true when the command takes over the screen
/// (`top`, an editor, a long-running pipe) and its output belongs in the live view.
pub trait CommandClassifier: Send + Sync {
    fn is_streaming(&self, command: &str) -> bool;
}

impl<F> CommandClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_streaming(&self, command: &str) -> bool {
        self(command)
    }
}

/// Closed allow-list of streaming commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    exact: Vec<String>,
    prefixes: Vec<String>,
}

impl AllowList {
    pub fn new<E, P>(exact: E, prefixes: P) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            exact: exact.into_iter().map(Into::into).collect(),
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(
            ["top", r#"bash -c "$(curl https://grademe.fr)""#],
            ["vim"],
        )
    }
}

impl CommandClassifier for AllowList {
    fn is_streaming(&self, command: &str) -> bool {
        let command = command.trim();
        if command.is_empty() {
            return false;
        }
        self.exact.iter().any(|c| c == command)
            || self.prefixes.iter().any(|p| command.starts_with(p.as_str()))
    }
}
