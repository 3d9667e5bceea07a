//! CLI bootstrap probe.
//!
//! # Responsibility
//! - Bring the configured store to a ready state (migrations + seed data).
//! - Print version and relation vocabulary for quick local sanity checks.

use log::info;
use std::process::ExitCode;
use toutdoux_core::repo::relation_type_repo::SqliteRelationTypeRepository;
use toutdoux_core::{bootstrap, core_version, CoreConfig, RelationTypeRegistry};

fn main() -> ExitCode {
    let config = CoreConfig::from_env();
    println!("toutdoux_core version={}", core_version());
    println!("toutdoux db_path={}", config.db_path.display());

    let conn = match bootstrap(&config) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("bootstrap failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    let relation_types = SqliteRelationTypeRepository::try_new(&conn)
        .and_then(|repo| RelationTypeRegistry::new(repo).list());
    match relation_types {
        Ok(types) => {
            for relation_type in &types {
                println!(
                    "relation_type name=\"{}\" reverse=\"{}\"",
                    relation_type.name, relation_type.reverse_name
                );
            }
            info!(
                "event=cli_probe module=cli status=ok relation_types={}",
                types.len()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("relation type listing failed: {err}");
            ExitCode::FAILURE
        }
    }
}
