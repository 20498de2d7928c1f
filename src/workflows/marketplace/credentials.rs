use uuid::Uuid;

/// Hashes the initial secret derived during onboarding. The engine stores
/// the digest opaquely and never inspects it.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, secret: &str) -> String;
}

/// Name-based digest over a fixed namespace. Stands in for the real
/// credential service, which owns password hashing end to end.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpaqueCredentialHasher;

impl CredentialHasher for OpaqueCredentialHasher {
    fn hash(&self, secret: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, secret.as_bytes())
            .simple()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic_and_opaque() {
        let hasher = OpaqueCredentialHasher;
        let digest = hasher.hash("okafor");
        assert_eq!(digest, hasher.hash("okafor"));
        assert_ne!(digest, hasher.hash("okafor "));
        assert!(!digest.contains("okafor"));
    }
}
