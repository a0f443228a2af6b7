use crate::Context;

/// Signature creation and verification, supplied by the key/identity collaborator.
///
/// The consensus core never touches key material directly.
pub trait SigningProvider<Ctx>
where
    Self: Send + Sync,
    Ctx: Context,
{
    /// Sign the given bytes with the local operator's key.
    fn sign(&self, payload: &[u8]) -> Ctx::Signature;

    /// Verify that `signature` was produced over `payload` by `sender`.
    fn verify(&self, sender: &Ctx::Address, payload: &[u8], signature: &Ctx::Signature) -> bool;
}
