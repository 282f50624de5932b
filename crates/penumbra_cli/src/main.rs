use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use penumbra_core::Scene;
use penumbra_renderer::{render_distributed, save_image};

mod cli;
mod timing;

use cli::Args;
use timing::TimingLog;

fn init_logger(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_scene(args: &Args) -> Result<Scene> {
    match &args.scene {
        Some(path) => Scene::load(path).with_context(|| format!("Failed to load scene {}", path.display())),
        None => Ok(Scene::cornell_box()),
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.render_config()?;
    let workers = args.worker_count()?;
    let scene = load_scene(args)?;
    log::info!("Scene has {} spheres", scene.len());

    let timing = if args.no_timing {
        None
    } else {
        let log = TimingLog::create(&args.timing_dir, &args.run_tag)
            .with_context(|| format!("Failed to create timing log in {}", args.timing_dir.display()))?;
        Some(log)
    };

    let start = Instant::now();
    let image = render_distributed(&scene, &config, workers).context("Render failed")?;
    save_image(&image, &args.output).with_context(|| format!("Failed to write {}", args.output.display()))?;
    let elapsed = start.elapsed();

    if let Some(timing) = timing {
        timing
            .record(elapsed)
            .with_context(|| format!("Failed to write {}", timing.path().display()))?;
    }

    log::info!("Finished in {:.2}s", elapsed.as_secs_f64());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.into());

    log::info!("Starting penumbra");
    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn args_in(dir: &std::path::Path, extra: &[&str]) -> Args {
        let output = dir.join("out.ppm");
        let timing = dir.join("Data");
        let mut argv = vec![
            "penumbra".to_string(),
            "--width".into(),
            "8".into(),
            "--height".into(),
            "6".into(),
            "-w".into(),
            "3".into(),
            "-o".into(),
            output.display().to_string(),
            "--timing-dir".into(),
            timing.display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_run_writes_image_and_timing() {
        let dir = tempfile::tempdir().unwrap();
        let args = args_in(dir.path(), &["--run-tag", "smoke"]);
        run(&args).unwrap();

        let ppm = fs::read_to_string(dir.path().join("out.ppm")).unwrap();
        assert!(ppm.starts_with("P3\n8 6\n255\n"));

        let logs: Vec<_> = fs::read_dir(dir.path().join("Data")).unwrap().collect();
        assert_eq!(logs.len(), 1);
        let entry = logs[0].as_ref().unwrap();
        assert!(entry.file_name().to_str().unwrap().starts_with("smoke_"));
        let contents = fs::read_to_string(entry.path()).unwrap();
        assert!(contents.starts_with(','));
        assert!(contents[1..].parse::<u128>().is_ok());
    }

    #[test]
    fn test_run_without_timing() {
        let dir = tempfile::tempdir().unwrap();
        run(&args_in(dir.path(), &["--no-timing"])).unwrap();
        assert!(dir.path().join("out.ppm").exists());
        assert!(!dir.path().join("Data").exists());
    }

    #[test]
    fn test_run_with_scene_file() {
        let dir = tempfile::tempdir().unwrap();
        let scene_path = dir.path().join("scene.json");
        fs::write(&scene_path, Scene::cornell_box().to_json().unwrap()).unwrap();

        let scene_arg = scene_path.display().to_string();
        run(&args_in(dir.path(), &["--no-timing", "--scene", &scene_arg])).unwrap();
        assert!(dir.path().join("out.ppm").exists());
    }

    #[test]
    fn test_missing_scene_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json").display().to_string();
        let err = run(&args_in(dir.path(), &["--no-timing", "--scene", &missing])).unwrap_err();
        assert!(err.to_string().contains("Failed to load scene"));
    }
}
