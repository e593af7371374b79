use criterion::{criterion_group, criterion_main, Criterion};
use hd_keytree::bip44::{get_bip44_address_key_deriver, CoinTypeNode};
use hd_keytree::path::{PathSegment, Scheme};
use hd_keytree::{master, Curve, Network, Node, Primitives};
use tokio::runtime::Runtime;

const MNEMONIC: &str =
    "romance hurry grit huge rifle ordinary loud toss sound congress upset twist";

fn rt() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn bip32_root(rt: &Runtime, primitives: &Primitives) -> Node {
    rt.block_on(master::from_mnemonic(
        MNEMONIC,
        "",
        Curve::Secp256k1,
        Network::Mainnet,
        primitives,
    ))
    .unwrap()
}

fn bench_bip32_hardened_step(c: &mut Criterion) {
    let rt = rt();
    let primitives = Primitives::builtin();
    let root = bip32_root(&rt, &primitives);
    let segment = [PathSegment::index(Scheme::Bip32, 0, true).unwrap()];

    c.bench_function("bip32_hardened_step", |b| {
        b.iter(|| rt.block_on(root.derive(&segment, &primitives)).unwrap())
    });
}

fn bench_bip32_unhardened_step(c: &mut Criterion) {
    let rt = rt();
    let primitives = Primitives::builtin();
    let root = bip32_root(&rt, &primitives);
    let segment = [PathSegment::index(Scheme::Bip32, 0, false).unwrap()];

    c.bench_function("bip32_unhardened_step", |b| {
        b.iter(|| rt.block_on(root.derive(&segment, &primitives)).unwrap())
    });
}

fn bench_cip3_step(c: &mut Criterion) {
    let rt = rt();
    let primitives = Primitives::builtin();
    let entropy = hex::decode("46e62370a138a182a498b8e2885bc032379ddf38").unwrap();
    let root = rt
        .block_on(master::from_entropy(
            &entropy,
            Curve::Ed25519Bip32,
            Network::Mainnet,
            &primitives,
        ))
        .unwrap();
    let segment = [PathSegment::index(Scheme::Cip3, 0, true).unwrap()];

    c.bench_function("cip3_hardened_step", |b| {
        b.iter(|| rt.block_on(root.derive(&segment, &primitives)).unwrap())
    });
}

fn bench_full_bip44_chain(c: &mut Criterion) {
    let rt = rt();
    let primitives = Primitives::builtin();
    let root = bip32_root(&rt, &primitives);

    c.bench_function("bip44_full_address_derivation", |b| {
        b.iter(|| {
            rt.block_on(async {
                let coin_type_node = CoinTypeNode::from_root(&root, 60, &primitives)
                    .await
                    .unwrap();
                let deriver = get_bip44_address_key_deriver(&coin_type_node, 0, 0, &primitives)
                    .await
                    .unwrap();
                deriver.derive(0).await.unwrap()
            })
        })
    });
}

criterion_group!(
    benches,
    bench_bip32_hardened_step,
    bench_bip32_unhardened_step,
    bench_cip3_step,
    bench_full_bip44_chain,
);
criterion_main!(benches);
