pub trait OptionExt<T> {
    fn to_result<E, F>(self, on_empty: F) -> Result<T, E>
    where
        F: FnOnce() -> E;
}

impl<T> OptionExt<T> for Option<T> {
    fn to_result<E, F>(self, on_empty: F) -> Result<T, E>
    where
        F: FnOnce() -> E,
    {
        match self {
            Some(v) => Ok(v),
            None => Err(on_empty()),
        }
    }
}

/// Request fields arrive as optional strings where `""` means the same as absent.
pub trait OptionStringExt {
    fn non_blank(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn non_blank(self) -> Option<String> {
        self.filter(|value| !value.trim().is_empty())
    }
}

/// Native objects keep most lists optional; summaries only ever look at the head.
pub trait OptionVecExt<T> {
    fn first_item(&self) -> Option<&T>;
}

impl<T> OptionVecExt<T> for Option<Vec<T>> {
    fn first_item(&self) -> Option<&T> {
        self.as_ref().and_then(|items| items.first())
    }
}
