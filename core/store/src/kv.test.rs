use super::*;

#[tokio::test]
async fn test_get_set_remove() {
    let kv = MemoryKv::new();
    assert!(kv.get("k").await.unwrap().is_none());

    kv.set("k", "v".to_string()).await.unwrap();
    assert_eq!(kv.get("k").await.unwrap().unwrap(), "v");

    assert!(kv.remove("k").await.unwrap());
    assert!(!kv.remove("k").await.unwrap());
}

#[tokio::test]
async fn test_keys_with_prefix() {
    let kv = MemoryKv::new();
    kv.set("a:1", "x".to_string()).await.unwrap();
    kv.set("a:2", "y".to_string()).await.unwrap();
    kv.set("b:1", "z".to_string()).await.unwrap();

    let keys = kv.keys_with_prefix("a:").await.unwrap();
    assert_eq!(keys, vec!["a:1", "a:2"]);
}
