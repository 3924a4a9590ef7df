use criterion::{black_box, criterion_group, criterion_main, Criterion};

use std::sync::Arc;

use bizops_auth::{CoreRole, HashedSecret, Identity, NewUser, TokenCodec};
use bizops_infra::{AccessGate, CredentialStore, InMemoryCredentialStore};
use chrono::Utc;

/// Hashing is not what's measured here; any PHC string will do.
fn placeholder_hash() -> HashedSecret {
    HashedSecret::from_phc("$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNoaGFzaA")
}

fn seeded_store(rt: &tokio::runtime::Runtime) -> (Arc<InMemoryCredentialStore>, Identity) {
    let store = Arc::new(InMemoryCredentialStore::new());
    let mut new_user = NewUser::registration("bench", "bench@example.com", placeholder_hash(), Utc::now())
        .expect("valid user");
    new_user.role = CoreRole::Standard;
    let record = rt.block_on(store.create_user(new_user)).expect("insert user");
    (store, Identity::Core(record.identity()))
}

fn bench_token_issue_verify(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let (_, identity) = seeded_store(&rt);
    let codec = TokenCodec::with_default_ttl(b"bench-secret");

    c.bench_function("token_issue", |b| {
        b.iter(|| codec.issue(black_box(&identity), Utc::now()).expect("issue"))
    });

    let token = codec.issue(&identity, Utc::now()).expect("issue").token;
    c.bench_function("token_verify", |b| {
        b.iter(|| codec.verify(black_box(&token), Utc::now()).expect("verify"))
    });

    let tampered = format!("{}x", token);
    c.bench_function("token_verify_rejected", |b| {
        b.iter(|| codec.verify(black_box(&tampered), Utc::now()).is_err())
    });
}

fn bench_gate_authenticate(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let (store, identity) = seeded_store(&rt);
    let codec = TokenCodec::with_default_ttl(b"bench-secret");
    let header = format!("Bearer {}", codec.issue(&identity, Utc::now()).expect("issue").token);

    let store: Arc<dyn CredentialStore> = store;
    let gate = AccessGate::new(store, codec);

    c.bench_function("gate_authenticate_core", |b| {
        b.iter(|| {
            rt.block_on(gate.authenticate_core(black_box(Some(header.as_str())), Utc::now()))
                .expect("authenticate")
        })
    });
}

criterion_group!(benches, bench_token_issue_verify, bench_gate_authenticate);
criterion_main!(benches);
