use clap::{Parser, Subcommand};
use obscura_core::address::Address;
use obscura_core::config::Config;
use obscura_core::crypto;
use obscura_core::facade::Core;
use obscura_core::kv::MemoryKv;
use obscura_core::vm::EchoVm;

#[derive(Parser)]
#[command(name = "obscura")]
#[command(about = "Obscura blockchain CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full node
    Node,
    /// Print a freshly generated wallet keypair
    Wallet,
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Node => run_node(),
        Commands::Wallet => print_new_wallet(),
    }
}

fn run_node() {
    let node_keypair = obscura_wallet::generate_keypair();
    let address = Address::new(crypto::address_bytes_of(&node_keypair.public));
    let core = Core::new(MemoryKv::new(), EchoVm, address, Config::default())
        .expect("core initialization failed");
    println!("obscura node started, address={address}, tip depth={}", core.top_block().depth);
}

fn print_new_wallet() {
    let keypair = obscura_wallet::generate_keypair();
    let address = Address::new(crypto::address_bytes_of(&keypair.public));
    println!("address: {address}");
    println!("secret:  {}", obscura_wallet::secret_to_hex(&keypair));
}
