//! `saga keygen` - generate a token signing key.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use saga_auth::KeyPair;

pub fn generate(output: Option<PathBuf>) -> Result<()> {
    let keypair = KeyPair::generate()?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, keypair.private_key_hex())?;
            println!("Wrote private key to {}", path.display());
            println!("Public key: {}", keypair.public_key_hex());
            println!();
            println!("Keep the private key out of version control. Point auth.private_key_file at it,");
            println!("or export it:");
            println!("  export SAGA_TOKEN_KEY=$(cat {})", path.display());
        }
        None => {
            println!("{}", keypair.private_key_hex());
        }
    }
    Ok(())
}
