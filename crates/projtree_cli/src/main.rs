//! CLI smoke entry point.
//!
//! Seeds an in-memory project tree and prints one ancestry path and one
//! proximity query, so `projtree_core` wiring can be checked without a
//! transport layer.
//!
//! Usage: `projtree [--log-dir <dir>]`. Logs default to `projtree-logs`
//! under the system temp directory.

use projtree_core::db::open_db_in_memory;
use projtree_core::{
    default_log_level, init_logging, GeoPoint, MemoryExistenceCache, Project, ProjectManager,
    ProjectRepository, RepositoryConfig, SqliteProjectStore,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("projtree smoke run failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let log_dir = log_dir_from_args(std::env::args().skip(1))?;
    init_logging(default_log_level(), &log_dir.to_string_lossy())?;
    println!("projtree_core version={}", projtree_core::core_version());
    println!("log_dir={}", log_dir.display());

    let config = RepositoryConfig::default();
    let conn = open_db_in_memory()?;
    let store = SqliteProjectStore::try_new(&conn)?;
    let cache = MemoryExistenceCache::from_config(&config)?;
    let manager = ProjectManager::new(ProjectRepository::with_config(store, cache, config));

    manager.add(
        &Project::new("region")
            .location("Equator")
            .coordinate(GeoPoint::new(0.0, 0.0)?),
    )?;
    manager.add(
        &Project::with_parent("site", "region")
            .description("field site")
            .coordinate(GeoPoint::new(0.0, 0.1)?),
    )?;

    let path = manager.get_project_path("site")?;
    let ids: Vec<&str> = path.iter().map(|p| p.project_id.as_str()).collect();
    println!("path(site)={}", ids.join(" > "));

    for radius_km in [10.0, 12.0] {
        let nearby = manager.find_nearby_projects(GeoPoint::new(0.0, 0.0)?, radius_km)?;
        let ids: Vec<&str> = nearby.iter().map(|p| p.project_id.as_str()).collect();
        println!("nearby(0,0; {radius_km} km)={}", ids.join(","));
    }

    println!(
        "exists(site)={} exists(ghost)={}",
        manager.is_project_id_exist("site")?,
        manager.is_project_id_exist("ghost")?
    );
    Ok(())
}

fn log_dir_from_args(
    mut args: impl Iterator<Item = String>,
) -> Result<PathBuf, Box<dyn Error>> {
    let dir = match (args.next().as_deref(), args.next()) {
        (None, _) => std::env::temp_dir().join("projtree-logs"),
        (Some("--log-dir"), Some(dir)) => PathBuf::from(dir),
        _ => return Err("usage: projtree [--log-dir <dir>]".into()),
    };
    if dir.is_absolute() {
        Ok(dir)
    } else {
        Ok(std::env::current_dir()?.join(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::log_dir_from_args;

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values
            .iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn log_dir_defaults_to_temp_dir() {
        let dir = log_dir_from_args(args(&[])).unwrap();
        assert_eq!(dir, std::env::temp_dir().join("projtree-logs"));
    }

    #[test]
    fn log_dir_flag_is_made_absolute() {
        let dir = log_dir_from_args(args(&["--log-dir", "logs"])).unwrap();
        assert!(dir.is_absolute());
        assert!(dir.ends_with("logs"));
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        assert!(log_dir_from_args(args(&["--verbose"])).is_err());
        assert!(log_dir_from_args(args(&["--log-dir"])).is_err());
    }
}
