//! End-to-end ring scenarios, driven over real loopback gRPC connections
//! rather than an in-process mock transport.

mod common;

use std::time::Duration;

use chord::key::Key;
use common::{remote_of, spawn_node, stabilize_n, test_config};

/// Picks loopback ports whose `Key::from_host` hash (the real
/// `key(host) = hash(host) mod 2^m` derivation) lands on each of the wanted
/// keys on an 8-bit ring — small enough that brute-force port scanning
/// finds a fit quickly, without stubbing the hash function itself.
fn ports_for_keys(bits: u32, start_port: u16, wanted_keys: &[u64]) -> Vec<u16> {
    let mut ports = Vec::new();
    for &wanted in wanted_keys {
        let mut port = start_port;
        loop {
            let key = Key::from_host("127.0.0.1", port, bits);
            if key.value() == wanted {
                ports.push(port);
                break;
            }
            port = port.checked_add(2).expect("port search exhausted");
        }
    }
    ports
}

#[tokio::test]
async fn single_node_ring() {
    let bits = 8;
    let ports = ports_for_keys(bits, 20000, &[10]);
    let node = spawn_node(ports[0], test_config(bits)).await;

    assert_eq!(node.core.self_key().value(), 10);
    assert!(node.core.predecessor().await.unwrap().is_none());

    let responsible = node.core.find_successor(Key::new(5, bits)).await.unwrap();
    assert_eq!(responsible.key().await.unwrap().value(), 10);

    let previous = node.core.put(Key::new(5, bits), b"x".to_vec()).await.unwrap();
    assert_eq!(previous, None);
    assert_eq!(node.core.get(Key::new(5, bits)).await.unwrap(), Some(b"x".to_vec()));

    node.kill();
}

#[tokio::test]
async fn two_node_join_converges() {
    let bits = 8;
    let ports = ports_for_keys(bits, 20100, &[10, 20]);
    let a = spawn_node(ports[0], test_config(bits)).await;
    let b = spawn_node(ports[1], test_config(bits)).await;

    b.core.join(remote_of(&a)).await.unwrap();

    for _ in 0..6 {
        stabilize_n(&a, 1).await;
        stabilize_n(&b, 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(a.core.successor().await.unwrap().key().await.unwrap().value(), 20);
    assert_eq!(b.core.successor().await.unwrap().key().await.unwrap().value(), 10);
    assert_eq!(
        a.core.predecessor().await.unwrap().unwrap().key().await.unwrap().value(),
        20
    );
    assert_eq!(
        b.core.predecessor().await.unwrap().unwrap().key().await.unwrap().value(),
        10
    );

    a.kill();
    b.kill();
}

#[tokio::test]
async fn routing_finds_correct_successor_from_every_node() {
    let bits = 8;
    let ports = ports_for_keys(bits, 20200, &[10, 20, 30, 40]);
    let mut nodes = Vec::new();
    for &port in &ports {
        nodes.push(spawn_node(port, test_config(bits)).await);
    }
    for i in 1..nodes.len() {
        nodes[i].core.join(remote_of(&nodes[0])).await.unwrap();
    }

    for _ in 0..40 {
        for node in &nodes {
            stabilize_n(node, 1).await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    for node in &nodes {
        let successor = node.core.find_successor(Key::new(25, bits)).await.unwrap();
        assert_eq!(successor.key().await.unwrap().value(), 30);
    }

    for node in &nodes {
        node.kill();
    }
}

#[tokio::test]
async fn handoff_moves_keys_to_the_newly_responsible_node() {
    let bits = 8;
    let ports = ports_for_keys(bits, 20300, &[10, 20, 30]);
    let n10 = spawn_node(ports[0], test_config(bits)).await;
    let n30 = spawn_node(ports[2], test_config(bits)).await;

    n30.core.join(remote_of(&n10)).await.unwrap();
    for _ in 0..6 {
        stabilize_n(&n10, 1).await;
        stabilize_n(&n30, 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    n10.core.put(Key::new(25, bits), b"v".to_vec()).await.unwrap();
    assert_eq!(
        n30.core.get_local(Key::new(25, bits)),
        Some(b"v".to_vec()),
        "25 should be stored on the node responsible for (10, 30]"
    );

    let n20 = spawn_node(ports[1], test_config(bits)).await;
    n20.core.join(remote_of(&n10)).await.unwrap();

    for _ in 0..10 {
        stabilize_n(&n10, 1).await;
        stabilize_n(&n20, 1).await;
        stabilize_n(&n30, 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(n20.core.get(Key::new(25, bits)).await.unwrap(), Some(b"v".to_vec()));
    assert_eq!(n30.core.get_local(Key::new(25, bits)), None);

    n10.kill();
    n20.kill();
    n30.kill();
}

#[tokio::test]
async fn dead_node_is_routed_around_after_failure() {
    let bits = 8;
    let ports = ports_for_keys(bits, 20400, &[10, 20, 30]);
    let n10 = spawn_node(ports[0], test_config(bits)).await;
    let n20 = spawn_node(ports[1], test_config(bits)).await;
    let n30 = spawn_node(ports[2], test_config(bits)).await;

    n20.core.join(remote_of(&n10)).await.unwrap();
    n30.core.join(remote_of(&n10)).await.unwrap();
    for _ in 0..8 {
        stabilize_n(&n10, 1).await;
        stabilize_n(&n20, 1).await;
        stabilize_n(&n30, 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    n20.kill();

    for _ in 0..10 {
        stabilize_n(&n10, 1).await;
        stabilize_n(&n30, 1).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
    }

    assert_eq!(n10.core.successor().await.unwrap().key().await.unwrap().value(), 30);
    assert_eq!(
        n30.core.predecessor().await.unwrap().unwrap().key().await.unwrap().value(),
        10
    );

    n10.kill();
    n30.kill();
}

#[tokio::test]
async fn key_wraps_past_the_top_of_the_ring() {
    let bits = 8;
    let ports = ports_for_keys(bits, 20500, &[5, 250]);
    let n5 = spawn_node(ports[0], test_config(bits)).await;
    let n250 = spawn_node(ports[1], test_config(bits)).await;

    n250.core.join(remote_of(&n5)).await.unwrap();
    for _ in 0..6 {
        stabilize_n(&n5, 1).await;
        stabilize_n(&n250, 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // 252 wraps past 255 back to 5.
    let successor = n5.core.find_successor(Key::new(252, bits)).await.unwrap();
    assert_eq!(successor.key().await.unwrap().value(), 5);

    n5.kill();
    n250.kill();
}
