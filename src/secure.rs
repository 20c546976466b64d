use zeroize::ZeroizeOnDrop;

/// [`String`] whose memory is zeroed out when dropped.
///
/// Decrypted parameter values pass through here on their way to the
/// terminal.
#[derive(Clone, ZeroizeOnDrop)]
pub struct ZeroizedString(String);

impl ZeroizedString {
    pub fn new(inner: String) -> Self {
        Self(inner)
    }
}

impl AsRef<str> for ZeroizedString {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}
