pub mod sso_provider;
