use dupfind::config::Config;
use dupfind::duplicates::Strategy;
use figment::providers::{Format, Serialized, Toml};
use figment::{Figment, Jail};
use std::path::Path;

// Config::load reads the process environment, so every test that calls it
// runs inside a Jail, which serializes them and restores the environment.

#[test]
fn test_config_load_defaults() {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.strategy, Strategy::FanOut);
    assert_eq!(config.buffer_size, 64 * 1024);
}

#[test]
fn test_config_load_from_env() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "")?;
        jail.set_env("DUPFIND_STRATEGY", "pipeline");
        jail.set_env("DUPFIND_WORKERS", 7);

        let config = Config::load(Some(Path::new("config.toml")))?;
        assert_eq!(config.strategy, Strategy::Pipeline);
        assert_eq!(config.workers, 7);
        Ok(())
    });
}

#[test]
fn test_config_load_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
strategy = "sequential"
io_limit = 5
threads = 3
"#,
        )?;

        let config = Config::load(Some(Path::new("config.toml")))?;
        assert_eq!(config.strategy, Strategy::Sequential);
        assert_eq!(config.io_limit, 5);
        assert_eq!(config.threads, 3);
        // Unset keys keep their defaults
        assert_eq!(config.buffer_size, Config::default().buffer_size);
        Ok(())
    });
}

#[test]
fn test_env_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "io_limit = 5\nworkers = 2\n")?;
        jail.set_env("DUPFIND_IO_LIMIT", 11);

        let config = Config::load(Some(Path::new("config.toml")))?;
        assert_eq!(config.io_limit, 11);
        assert_eq!(config.workers, 2);
        Ok(())
    });
}

#[test]
fn test_config_toml_roundtrip() {
    let original = Config {
        strategy: Strategy::MultiWalker,
        io_limit: 9,
        threads: 2,
        workers: 4,
        buffer_size: 8192,
        mmap_threshold: Some(4 << 20),
    };
    let loaded: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::string(&toml::to_string(&original).unwrap()))
        .extract()
        .unwrap();
    assert_eq!(loaded, original);
}

#[test]
fn test_mmap_threshold_from_toml_and_env() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "mmap_threshold = 1048576
")?;

        let config = Config::load(Some(Path::new("config.toml")))?;
        assert_eq!(config.mmap_threshold, Some(1_048_576));
        assert_eq!(config.finder_config().mmap_threshold, Some(1_048_576));

        jail.set_env("DUPFIND_MMAP_THRESHOLD", 4096);
        let config = Config::load(Some(Path::new("config.toml")))?;
        assert_eq!(config.mmap_threshold, Some(4096));
        Ok(())
    });
}

#[test]
fn test_mmap_threshold_unset_by_default() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "strategy = \"multiwalker\"\n")?;

        let config = Config::load(Some(Path::new("config.toml")))?;
        assert_eq!(config.strategy, Strategy::MultiWalker);
        assert_eq!(config.mmap_threshold, None);
        Ok(())
    });
}

#[test]
fn test_config_zero_values_clamped() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "io_limit = 0\nthreads = 0\n")?;

        let config = Config::load(Some(Path::new("config.toml")))?;
        assert_eq!(config.io_limit, 1);
        assert_eq!(config.threads, 1);
        Ok(())
    });
}

#[test]
fn test_config_invalid_values() {
    Jail::expect_with(|jail| {
        jail.create_file("bad_type.toml", "io_limit = \"lots\"\n")?;
        jail.create_file("bad_strategy.toml", "strategy = \"threads\"\n")?;

        assert!(Config::load(Some(Path::new("bad_type.toml"))).is_err());
        assert!(Config::load(Some(Path::new("bad_strategy.toml"))).is_err());
        assert!(Config::load(Some(Path::new("missing.toml"))).is_err());
        Ok(())
    });
}
