use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use kiln_core::{BatchRequest, Dispatcher, Error, Inputs, Registry, SizeExpression, SizeUnit};
use kiln_methods::{register_all, Configuration, Detached, PackageVersion, TextureVersion, Toolkit};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Pack {
        data_file: PathBuf,
        definition_file: PathBuf,
        version: PackageVersion,
        buffer: (usize, usize),
    },
    Unpack {
        data_file: PathBuf,
        resource_directory: PathBuf,
    },
    Encrypt {
        plain_file: PathBuf,
        cipher_file: PathBuf,
        key: Vec<u8>,
    },
    DecodeTexture {
        size: (u32, u32),
        format: String,
    },
    Other(&'static str),
}

#[derive(Default)]
struct Recording {
    calls: Mutex<Vec<Call>>,
}

impl Recording {
    fn record(&self, call: Call) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Toolkit for Recording {
    fn name(&self) -> &str {
        "recording"
    }

    fn pack_package(
        &self,
        data_file: &Path,
        definition_file: &Path,
        _resource_directory: &Path,
        version: PackageVersion,
        buffer: &mut [u8],
    ) -> anyhow::Result<()> {
        self.record(Call::Pack {
            data_file: data_file.to_path_buf(),
            definition_file: definition_file.to_path_buf(),
            version,
            buffer: (buffer.as_ptr() as usize, buffer.len()),
        })
    }

    fn unpack_package(
        &self,
        data_file: &Path,
        _definition_file: &Path,
        resource_directory: &Path,
        _version: PackageVersion,
    ) -> anyhow::Result<()> {
        self.record(Call::Unpack {
            data_file: data_file.to_path_buf(),
            resource_directory: resource_directory.to_path_buf(),
        })
    }

    fn pack_package_automatic(&self, _: &Path, _: &Path, _: PackageVersion) -> anyhow::Result<()> {
        self.record(Call::Other("pack_package_automatic"))
    }

    fn encrypt_xor(&self, plain_file: &Path, cipher_file: &Path, key: &[u8]) -> anyhow::Result<()> {
        self.record(Call::Encrypt {
            plain_file: plain_file.to_path_buf(),
            cipher_file: cipher_file.to_path_buf(),
            key: key.to_vec(),
        })
    }

    fn encode_sexy_texture(&self, _: &Path, _: &Path, _: &str, _: bool, _: TextureVersion) -> anyhow::Result<()> {
        self.record(Call::Other("encode_sexy_texture"))
    }

    fn decode_sexy_texture(&self, _: &Path, _: &Path, _: TextureVersion) -> anyhow::Result<()> {
        self.record(Call::Other("decode_sexy_texture"))
    }

    fn encode_texture(&self, _: &Path, _: &Path, _: &str) -> anyhow::Result<()> {
        self.record(Call::Other("encode_texture"))
    }

    fn decode_texture(&self, _: &Path, _: &Path, size: (u32, u32), format: &str) -> anyhow::Result<()> {
        self.record(Call::DecodeTexture {
            size,
            format: format.to_string(),
        })
    }
}

fn small_buffers() -> Configuration {
    let mut configuration = Configuration::default();
    configuration.popcap_package.pack_buffer_size = SizeExpression::new(1.0, SizeUnit::K);
    configuration
}

fn dispatcher(toolkit: Arc<dyn Toolkit>) -> Dispatcher {
    let mut builder = Registry::builder();
    register_all(&mut builder, toolkit, &small_buffers()).expect("register");
    Dispatcher::new(builder.build())
}

#[test]
fn every_group_is_registered() {
    let dispatcher = dispatcher(Arc::new(Detached));
    let ids: Vec<&str> = dispatcher.registry().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "popcap.package.pack",
            "popcap.package.unpack",
            "popcap.package.pack_automatic",
            "popcap.package.encrypt",
            "popcap.sexy_texture.encode",
            "popcap.sexy_texture.decode",
            "texture.encoding.encode",
            "texture.encoding.decode",
        ]
    );
}

#[test]
fn pack_writes_next_to_bundle() {
    let tmp = tempfile::tempdir().expect("tmp dir");
    let bundle = tmp.path().join("x.pak.bundle");
    fs::create_dir(&bundle).expect("mkdir");

    let recording = Arc::new(Recording::default());
    let dispatcher = dispatcher(recording.clone());
    let args = dispatcher
        .invoke("popcap.package.pack", Some(&bundle), &Inputs::new())
        .expect("pack");

    assert_eq!(args.path("data_file").unwrap(), tmp.path().join("x.pak"));
    match recording.calls().as_slice() {
        [Call::Pack { data_file, definition_file, version, buffer }] => {
            assert_eq!(data_file, &tmp.path().join("x.pak"));
            assert_eq!(definition_file, &bundle.join("definition.json"));
            assert_eq!(
                *version,
                PackageVersion { number: 0, compress_resource_data: false }
            );
            assert_eq!(buffer.1, 1024);
        }
        other => panic!("unexpected calls: {other:?}"),
    }
}

#[test]
fn pack_rejects_unusable_buffer_sizes() {
    let tmp = tempfile::tempdir().expect("tmp dir");
    let bundle = tmp.path().join("x.pak.bundle");
    fs::create_dir(&bundle).expect("mkdir");

    let recording = Arc::new(Recording::default());
    let dispatcher = dispatcher(recording.clone());
    for text in ["infm", "nanm", "-4m"] {
        let err = dispatcher
            .invoke(
                "popcap.package.pack",
                Some(&bundle),
                &Inputs::new().with_text("buffer_size", text),
            )
            .unwrap_err();
        assert!(
            matches!(err, Error::Malformed { ref argument, .. } if argument == "buffer_size"),
            "{text}: {err}"
        );
    }

    let err = dispatcher
        .invoke(
            "popcap.package.pack",
            Some(&bundle),
            &Inputs::new().with_text("buffer_size", "1000000000000g"),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Rejected { ref argument, .. } if argument == "buffer_size"));
    assert!(recording.calls().is_empty());
}

#[test]
fn batch_pack_reuses_one_buffer() {
    let tmp = tempfile::tempdir().expect("tmp dir");
    for name in ["a.pak.bundle", "b.PAK.bundle", "c.txt"] {
        fs::create_dir(tmp.path().join(name)).expect("mkdir");
    }

    let recording = Arc::new(Recording::default());
    let dispatcher = dispatcher(recording.clone());
    let report = dispatcher
        .batch("popcap.package.pack", &BatchRequest::new(tmp.path()))
        .expect("batch");
    assert_eq!(report.len(), 2);

    let buffers: Vec<(usize, usize)> = recording
        .calls()
        .into_iter()
        .map(|call| match call {
            Call::Pack { buffer, .. } => buffer,
            other => panic!("unexpected call: {other:?}"),
        })
        .collect();
    assert_eq!(buffers.len(), 2);
    assert_eq!(buffers[0], buffers[1]);
    assert_eq!(
        report.items[1].arguments.path("data_file").unwrap(),
        tmp.path().join("b.pak")
    );
}

#[test]
fn batch_unpack_rebases_under_output_root() {
    let tmp = tempfile::tempdir().expect("tmp dir");
    let out = tempfile::tempdir().expect("out dir");
    fs::create_dir(tmp.path().join("levels")).expect("mkdir");
    fs::write(tmp.path().join("levels").join("main.pak"), b"pak").expect("write");

    let recording = Arc::new(Recording::default());
    let dispatcher = dispatcher(recording.clone());
    dispatcher
        .batch(
            "popcap.package.unpack",
            &BatchRequest::new(tmp.path()).output_root(out.path()),
        )
        .expect("batch");

    assert_eq!(
        recording.calls(),
        vec![Call::Unpack {
            data_file: tmp.path().join("levels").join("main.pak"),
            resource_directory: out.path().join("levels").join("main.pak.bundle").join("resource"),
        }]
    );
}

#[test]
fn encrypt_uses_fixed_key() {
    let tmp = tempfile::tempdir().expect("tmp dir");
    let plain = tmp.path().join("main.pak");
    fs::write(&plain, b"pak").expect("write");

    let recording = Arc::new(Recording::default());
    dispatcher(recording.clone())
        .invoke("popcap.package.encrypt", Some(&plain), &Inputs::new())
        .expect("encrypt");

    assert_eq!(
        recording.calls(),
        vec![Call::Encrypt {
            plain_file: plain.clone(),
            cipher_file: tmp.path().join("main.cipher.pak"),
            key: vec![0xF7],
        }]
    );
}

#[test]
fn texture_decode_rejects_zero_width() {
    let tmp = tempfile::tempdir().expect("tmp dir");
    let data = tmp.path().join("atlas.bin");
    fs::write(&data, b"raw").expect("write");

    let recording = Arc::new(Recording::default());
    let dispatcher = dispatcher(recording.clone());
    let inputs = Inputs::new()
        .with_text("format", "rgba_8888")
        .with_text("image_width", "0")
        .with_text("image_height", "64");
    let err = dispatcher
        .invoke("texture.encoding.decode", Some(&data), &inputs)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Rejected { ref argument, ref message, .. }
            if argument == "image_width" && message == "size must be greater than zero"
    ));
    assert!(recording.calls().is_empty());

    let wide = inputs.clone().with_text("image_width", "5000000000");
    let err = dispatcher
        .invoke("texture.encoding.decode", Some(&data), &wide)
        .unwrap_err();
    assert!(matches!(err, Error::Rejected { ref argument, .. } if argument == "image_width"));
    assert!(recording.calls().is_empty());

    let inputs = inputs.with_text("image_width", "128");
    dispatcher
        .invoke("texture.encoding.decode", Some(&data), &inputs)
        .expect("decode");
    assert_eq!(
        recording.calls(),
        vec![Call::DecodeTexture {
            size: (128, 64),
            format: "rgba_8888".to_string(),
        }]
    );
}

#[test]
fn texture_format_must_be_known() {
    let tmp = tempfile::tempdir().expect("tmp dir");
    let image = tmp.path().join("atlas.png");
    fs::write(&image, b"png").expect("write");

    let err = dispatcher(Arc::new(Recording::default()))
        .invoke(
            "popcap.sexy_texture.encode",
            Some(&image),
            &Inputs::new().with_text("format", "bogus"),
        )
        .unwrap_err();
    assert!(matches!(err, Error::NotInOptions { ref argument, .. } if argument == "format"));
}

#[test]
fn texture_encoding_has_no_batch() {
    let tmp = tempfile::tempdir().expect("tmp dir");
    let err = dispatcher(Arc::new(Recording::default()))
        .batch("texture.encoding.encode", &BatchRequest::new(tmp.path()))
        .unwrap_err();
    assert!(matches!(err, Error::BatchUnsupported { .. }));
}

#[test]
fn detached_toolkit_fails_in_worker_only() {
    let tmp = tempfile::tempdir().expect("tmp dir");
    let plain = tmp.path().join("main.pak");
    fs::write(&plain, b"pak").expect("write");

    let dispatcher = dispatcher(Arc::new(Detached));
    assert!(dispatcher
        .resolve("popcap.package.encrypt", Some(&plain), &Inputs::new())
        .is_ok());

    let err = dispatcher
        .invoke("popcap.package.encrypt", Some(&plain), &Inputs::new())
        .unwrap_err();
    match err {
        Error::Worker { method, source } => {
            assert_eq!(method, "popcap.package.encrypt");
            assert_eq!(source.to_string(), "no kernel loaded, cannot encrypt");
        }
        other => panic!("unexpected error: {other}"),
    }
}
