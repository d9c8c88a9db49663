//! # Integration Tests
//!
//! Workspace-level end-to-end tests.
//!
//! Covers:
//! - contract snapshot tests
//! - config file -> endpoints -> engine, over real files and sockets
//! - sessions chained through in-process pipes

#[cfg(test)]
mod contract_tests {
    use contracts::{ConfigVersion, SinkFailurePolicy, TeeBlueprint};

    #[test]
    fn test_contract_defaults() {
        let bp = TeeBlueprint::tee(&[], false, true);
        assert_eq!(bp.version, ConfigVersion::V1);
        assert_eq!(bp.engine.on_sink_error, SinkFailurePolicy::Abort);
        assert_eq!(bp.sinks.len(), 1);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;

    use config_loader::{ConfigFormat, ConfigLoader};
    use fanout::{open_blueprint, FanOut, Pipe, PolicyExt, SessionOutcome, SinkStatus};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Deterministic payload larger than one read
    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    fn toml_path(path: &Path) -> String {
        path.display().to_string().replace('\\', "/")
    }

    /// End-to-end test: file source -> two file sinks, driven by a TOML config
    #[tokio::test]
    async fn test_e2e_file_to_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.bin");
        let out_a = dir.path().join("a.bin");
        let out_b = dir.path().join("b.bin");
        let data = payload(300_000);
        std::fs::write(&input, &data).unwrap();

        let config = format!(
            r#"
[source]
kind = "file"
path = "{}"

[engine]
read_capacity = 4096

[[sinks]]
name = "a"
kind = "file"
path = "{}"

[[sinks]]
name = "b"
kind = "file"
path = "{}"
"#,
            toml_path(&input),
            toml_path(&out_a),
            toml_path(&out_b)
        );

        let blueprint = ConfigLoader::load_from_str(&config, ConfigFormat::Toml).unwrap();
        let report = open_blueprint(&blueprint)
            .await
            .unwrap()
            .run()
            .await
            .unwrap()
            .ensure_complete()
            .unwrap();

        assert_eq!(report.outcome, SessionOutcome::EndOfStream);
        assert_eq!(report.bytes, data.len() as u64);
        assert!(report.chunks >= (data.len() / 4096) as u64);
        assert!(report.chunk_bytes.max <= 4096.0);
        assert_eq!(std::fs::read(&out_a).unwrap(), data);
        assert_eq!(std::fs::read(&out_b).unwrap(), data);
        for sink in &report.sinks {
            assert_eq!(sink.status, SinkStatus::Closed);
        }
    }

    /// Append mode keeps what the file already held
    #[tokio::test]
    async fn test_e2e_append() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        let out = dir.path().join("out.txt");
        std::fs::write(&input, b"new").unwrap();
        std::fs::write(&out, b"old-").unwrap();

        let config = format!(
            r#"{{
                "source": {{ "kind": "file", "path": "{}" }},
                "sinks": [{{ "name": "log", "kind": "file", "path": "{}", "append": true }}]
            }}"#,
            toml_path(&input),
            toml_path(&out)
        );

        let blueprint = ConfigLoader::load_from_str(&config, ConfigFormat::Json).unwrap();
        open_blueprint(&blueprint)
            .await
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), b"old-new");
    }

    /// A TCP peer receives the stream and then EOF
    #[tokio::test]
    async fn test_e2e_tcp_sink() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let receiver = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.bin");
        let copy = dir.path().join("copy.bin");
        let data = payload(50_000);
        std::fs::write(&input, &data).unwrap();

        let config = format!(
            r#"
[source]
kind = "file"
path = "{}"

[[sinks]]
name = "remote"
kind = "tcp"
addr = "{addr}"

[[sinks]]
name = "copy"
kind = "file"
path = "{}"
"#,
            toml_path(&input),
            toml_path(&copy)
        );

        let blueprint = ConfigLoader::load_from_str(&config, ConfigFormat::Toml).unwrap();
        let report = open_blueprint(&blueprint)
            .await
            .unwrap()
            .run()
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(receiver.await.unwrap(), data);
        assert_eq!(std::fs::read(&copy).unwrap(), data);
    }

    /// Two sessions chained through a pipe; end-of-stream propagates because
    /// the first session closes the pipe's write end
    #[tokio::test]
    async fn test_e2e_chained_pipes() {
        let input = Pipe::named("input");
        let middle = Pipe::named("middle");
        let side = Pipe::named("side");
        let output = Pipe::named("output");
        let data = payload(10_000);

        let first = FanOut::builder(input.clone())
            .sinks([middle.clone(), side.clone()])
            .build()
            .unwrap()
            .spawn();
        let second = FanOut::builder(middle.clone())
            .sink(output.clone())
            .build()
            .unwrap()
            .spawn();

        let side_reader = {
            let side = side.clone();
            tokio::spawn(async move { side.read_end().read_to_end().await.unwrap() })
        };
        let output_reader = {
            let output = output.clone();
            tokio::spawn(async move { output.read_end().read_to_end().await.unwrap() })
        };

        input.write_end().write_bytes(data.clone()).await.unwrap();
        input.write_end().shutdown().await.unwrap();

        let first_report = first.join().await.unwrap();
        let second_report = second.join().await.unwrap();

        assert_eq!(first_report.bytes, data.len() as u64);
        assert_eq!(second_report.bytes, data.len() as u64);
        assert_eq!(side_reader.await.unwrap(), data);
        assert_eq!(output_reader.await.unwrap(), data);
    }

    /// Overriding the write close flag leaves the pipe usable afterwards
    #[tokio::test]
    async fn test_e2e_keep_sink_open() {
        let input = Pipe::named("input");
        let shared = Pipe::named("shared");

        let session = FanOut::builder(input.clone())
            .sink(shared.clone().with_write_close(false))
            .build()
            .unwrap()
            .spawn();

        input.write_end().write_bytes(&b"first "[..]).await.unwrap();
        input.write_end().shutdown().await.unwrap();
        session.join().await.unwrap();

        shared.write_end().write_bytes(&b"second"[..]).await.unwrap();
        shared.write_end().shutdown().await.unwrap();

        assert_eq!(
            shared.read_end().read_to_end().await.unwrap(),
            b"first second"
        );
    }
}
