#![no_main]

use std::sync::Arc;

use bincode::Options;
use libfuzzer_sys::fuzz_target;

use powgate_authorization::{
    AuthorizationConfig, AuthorizationTokenService, HashCashTokenService, ReplayGuard,
};
use powgate_types::{AuthorizationToken, AuthorizedMessage, NetworkLoad};

struct Raw<'a>(&'a [u8]);

impl AuthorizedMessage for Raw<'_> {
    fn cost_factor(&self) -> f64 {
        0.5
    }

    fn payload(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

fuzz_target!(|data: &[u8]| {
    // First byte splits the input into an encoded token and a message body.
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = (split as usize).min(rest.len());
    let (message, encoded) = rest.split_at(split);

    let Ok(token) = bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(64 * 1024)
        .deserialize::<AuthorizationToken>(encoded)
    else {
        return;
    };
    let Ok(service) =
        HashCashTokenService::from_config(&AuthorizationConfig::default(), Arc::new(ReplayGuard::new()))
    else {
        return;
    };

    // This must never panic regardless of input
    let _ = service.is_authorized(
        &Raw(message),
        &token,
        &NetworkLoad::new(0.5),
        Some(&NetworkLoad::new(0.25)),
        "fuzz",
        "fuzz.onion:1",
    );
});
