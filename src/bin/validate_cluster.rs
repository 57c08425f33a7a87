//! Operator diagnostic tool: connects to every node in a running cluster's
//! dev-mode `NodeSummary` RPC and checks ring-wide invariants — predecessor
//! ordering and finger correctness. Useful for manual soak-testing beyond
//! the automated test suite; every node must have been started with
//! `--dev-mode` or its summary call is refused.

use std::env;

use chord::key::Key;
use chord::proto;
use chord::proto::chord_client::ChordClient;
use tonic::Request;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let authorities: Vec<String> = env::args().skip(1).collect();
    if authorities.is_empty() {
        eprintln!("usage: validate_cluster <grpc-authority>...");
        std::process::exit(1);
    }

    let mut summaries = Vec::new();
    for authority in &authorities {
        let mut client = ChordClient::connect(authority.clone()).await?;
        let summary = client
            .node_summary(Request::new(proto::Empty {}))
            .await?
            .into_inner();
        summaries.push(summary);
    }

    summaries.sort_by_key(|s| s.key.as_ref().map(|k| k.value).unwrap_or(0));
    let ring_keys: Vec<u64> = summaries
        .iter()
        .map(|s| s.key.as_ref().map(|k| k.value).unwrap_or(0))
        .collect();

    let mut ok = true;

    // Every node's predecessor should be the node immediately before it on the ring.
    for i in 0..summaries.len() {
        let prev = &summaries[(i + summaries.len() - 1) % summaries.len()];
        let predecessor_key = summaries[i].predecessor.as_ref().and_then(|p| {
            summaries
                .iter()
                .find(|s| s.address.as_ref() == Some(p))
                .and_then(|s| s.key.as_ref())
                .map(|k| k.value)
        });
        let expected = prev.key.as_ref().map(|k| k.value);
        if predecessor_key != expected {
            ok = false;
            eprintln!(
                "node {} (key {:?}): predecessor key {:?}, expected {:?}",
                address_of(&summaries[i]),
                summaries[i].key.as_ref().map(|k| k.value),
                predecessor_key,
                expected,
            );
        }
    }

    // Finger i should resolve to the least key >= self_key.shift(i).
    for summary in &summaries {
        let self_key = summary.key.clone().unwrap_or_default();
        let key = Key::new(self_key.value, self_key.bits);
        for (i, finger) in summary.fingers.iter().enumerate() {
            let finger_key = summaries
                .iter()
                .find(|s| s.address.as_ref() == Some(finger))
                .and_then(|s| s.key.as_ref())
                .map(|k| k.value);
            let target = key.shift(i as u32).value();
            let expected = closest_successor(target, &ring_keys);
            if finger_key != Some(expected) {
                ok = false;
                eprintln!(
                    "node {}: finger[{}] points at key {:?}, expected the successor of {} ({})",
                    address_of(summary),
                    i,
                    finger_key,
                    target,
                    expected,
                );
            }
        }
    }

    if ok {
        println!("cluster looks consistent across {} node(s)", summaries.len());
        Ok(())
    } else {
        Err("cluster invariant violations detected".into())
    }
}

fn address_of(summary: &proto::NodeSummaryResponse) -> String {
    summary
        .address
        .as_ref()
        .map(|a| format!("{}:{}", a.address, a.port))
        .unwrap_or_default()
}

fn closest_successor(target: u64, sorted_ring_keys: &[u64]) -> u64 {
    sorted_ring_keys
        .iter()
        .copied()
        .find(|&k| k >= target)
        .unwrap_or_else(|| sorted_ring_keys[0])
}
