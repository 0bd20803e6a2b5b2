use asset_registry::{AssetRegistry, RegistryConfig, TextureAsset};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn registry_with_texture(tmp: &TempDir) -> (AssetRegistry, PathBuf) {
    let config = RegistryConfig::new(tmp.path().join("Assets"), tmp.path().join("Metadata"));
    let registry = AssetRegistry::new(config);
    registry.register_kind::<TextureAsset>();
    registry.initialize().unwrap();

    let source = tmp.path().join("bench.png");
    fs::write(&source, vec![0u8; 4096]).unwrap();
    (registry, source)
}

fn bench_idempotent_reimport(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let (registry, source) = registry_with_texture(&tmp);
    registry.import::<TextureAsset>(&source).unwrap();

    c.bench_function("idempotent_reimport", |b| {
        // Hot path: provisional-key hit, no kind hook, no file copy.
        b.iter(|| registry.import::<TextureAsset>(black_box(&source)).unwrap());
    });
}

fn bench_get_live_handle(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let (registry, source) = registry_with_texture(&tmp);
    let guid = registry.import::<TextureAsset>(&source).unwrap();
    registry.load_ref::<TextureAsset>(guid).unwrap();

    c.bench_function("get_live_handle", |b| {
        b.iter(|| {
            let handle = registry.get::<TextureAsset>(black_box(guid)).unwrap();
            black_box(handle.get().is_some());
        });
    });
}

fn bench_handle_deref(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let (registry, source) = registry_with_texture(&tmp);
    let guid = registry.import::<TextureAsset>(&source).unwrap();
    let handle = registry.get::<TextureAsset>(guid).unwrap();

    c.bench_function("handle_deref", |b| {
        // Lock-free read path.
        b.iter(|| black_box(handle.get().map(|t| t.len())));
    });
}

criterion_group!(
    benches,
    bench_idempotent_reimport,
    bench_get_live_handle,
    bench_handle_deref
);
criterion_main!(benches);
