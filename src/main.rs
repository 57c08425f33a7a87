use std::sync::Arc;

use clap::Parser;
use log::{info, warn, LevelFilter};
use tonic::transport::Server;

use chord::cli::Cli;
use chord::config::Config;
use chord::node::bootstrap;
use chord::node::remote::RemoteHandle;
use chord::node::service::ChordService;
use chord::node::NodeCore;
use chord::proto;
use chord::proto::chord_server::ChordServer;
use chord::repl;
use chord::scheduler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();
    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    simple_logger::SimpleLogger::new().env().with_level(level).init()?;

    args.host.warn_if_privileged();

    let mut config = match &args.config {
        Some(path) => Config::from_ini_file(path)?,
        None => Config::default(),
    };
    config.dev_mode = args.dev_mode;

    let node = NodeCore::new(args.host.clone(), config.clone());
    info!("node {} starting at key {}", node.host(), node.self_key());

    let bootstrap_host = node.host().clone();
    tokio::spawn(async move {
        if let Err(e) = bootstrap::serve(bootstrap_host).await {
            warn!("bootstrap listener exited: {}", e);
        }
    });

    let grpc_node = node.clone();
    let grpc_host = node.host().clone();
    tokio::spawn(async move {
        let chord_service = ChordServer::new(ChordService::new(grpc_node));
        let reflection_service = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(proto::FILE_DESCRIPTOR_SET)
            .build()
            .expect("failed to build reflection service");

        let socket_addr = match tokio::net::lookup_host(grpc_host.socket_addr_string()).await {
            Ok(mut addrs) => addrs.next().expect("host resolves to at least one address"),
            Err(e) => {
                warn!("failed to resolve {}: {}", grpc_host, e);
                return;
            }
        };

        info!("gRPC service listening on {}", socket_addr);
        if let Err(e) = Server::builder()
            .add_service(chord_service)
            .add_service(reflection_service)
            .serve(socket_addr)
            .await
        {
            warn!("gRPC server exited: {}", e);
        }
    });

    // Give the gRPC listener a moment to bind before anyone (including our
    // own bootstrap join below) tries to dial it.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    if let Some(known_peer) = &args.known_peer {
        info!("joining ring via known peer {}", known_peer);
        let known_grpc_host = bootstrap::connect(known_peer).await?;
        let known_peer_handle = Arc::new(RemoteHandle::new(known_grpc_host));
        node.join(known_peer_handle).await?;
    } else {
        info!("starting a new ring");
    }

    let stabilize_node = node.clone();
    let stabilize_interval = config.stabilize_interval;
    let _stabilize_schedule = scheduler::schedule("stabilize", stabilize_interval, move || {
        let node = stabilize_node.clone();
        async move { node.stabilize().await }
    });

    let repl_node = node.clone();
    let repl_handle = tokio::runtime::Handle::current();
    tokio::task::spawn_blocking(move || repl::run(repl_node, repl_handle))
        .await?;

    Ok(())
}
