//! Test: Assembly store - manifests written to and read from disk

use crate::helpers::*;
use deploy_pipeline::assembly::{AssemblyStore, DirectoryAssemblyStore, InMemoryAssemblyStore};
use deploy_pipeline::synth::synthesize;
use std::sync::Arc;

#[tokio::test]
async fn test_directory_store_keeps_latest_per_pipeline() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DirectoryAssemblyStore::new(tmp.path()).await.unwrap();
    let spec = load_service_pipeline();

    let first = synthesize(&spec).unwrap();
    let second = synthesize(&spec).unwrap();
    store.save(&first).await.unwrap();
    store.save(&second).await.unwrap();

    let summaries = store.list().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].synthesis_id, second.synthesis_id);

    let loaded = store.load(&spec.name).await.unwrap().unwrap();
    assert_eq!(loaded.synthesis_id, second.synthesis_id);
}

#[tokio::test]
async fn test_directory_store_lists_several_pipelines() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DirectoryAssemblyStore::new(tmp.path()).await.unwrap();

    let mut other = load_service_pipeline();
    other.name = "OtherServicePipeline".to_string();

    store.save(&synthesize(&load_service_pipeline()).unwrap()).await.unwrap();
    store.save(&synthesize(&other).unwrap()).await.unwrap();

    let mut names: Vec<_> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.pipeline_name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["MyServicePipeline", "OtherServicePipeline"]);
}

#[tokio::test]
async fn test_backends_behave_alike() {
    let tmp = tempfile::tempdir().unwrap();
    let backends: Vec<Arc<dyn AssemblyStore>> = vec![
        Arc::new(InMemoryAssemblyStore::new()),
        Arc::new(DirectoryAssemblyStore::new(tmp.path()).await.unwrap()),
    ];
    let manifest = synthesize(&load_service_pipeline()).unwrap();

    for store in backends {
        assert!(store.list().await.unwrap().is_empty());
        store.save(&manifest).await.unwrap();
        assert_eq!(store.load("MyServicePipeline").await.unwrap(), Some(manifest.clone()));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
