pub mod hmac_identity_provider;
