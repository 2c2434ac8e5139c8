#![cfg(test)]
#![allow(missing_docs)]

use {super::*, std::collections::HashMap};

fn scratch_file(name: &str, content: &str) -> PathBuf {
    let path = env::temp_dir().join(format!("cryptoport-{}-{name}", std::process::id()));
    fs::write(&path, content).unwrap();
    path
}

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |k| vars.get(k).cloned()
}

#[test]
fn defaults() {
    let cfg = ClientConfig::default();
    assert_eq!(cfg.url, "http://127.0.0.1:8008");
    assert!(cfg.keyfile.is_none());
    assert!(cfg.effective_wait().is_none());
}

#[test]
fn toml_and_json_files() {
    let path = scratch_file(
        "cfg.toml",
        "url = \"validator:8008/\"\nkeyfile = \"/keys/alice.priv\"\nwait = 30\n",
    );
    let cfg = ClientConfig::from_file(&path).unwrap();
    assert_eq!(cfg.url, "validator:8008");
    assert_eq!(cfg.keyfile, Some(PathBuf::from("/keys/alice.priv")));
    assert_eq!(cfg.wait, Some(Duration::from_secs(30)));
    fs::remove_file(path).unwrap();

    let path = scratch_file("cfg.json", r#"{"url": "https://ledger.example"}"#);
    let cfg = ClientConfig::from_file(&path).unwrap();
    assert_eq!(cfg.url, "https://ledger.example");
    assert!(cfg.wait.is_none());
    fs::remove_file(path).unwrap();

    let path = scratch_file("cfg.bad", "url = [");
    assert!(ClientConfig::from_file(&path).is_err());
    fs::remove_file(path).unwrap();

    assert!(ClientConfig::from_file(Path::new("/no/such/cryptoport.toml")).is_err());
}

#[test]
fn environment_overrides() {
    let cfg = ClientConfig::default()
        .overlay(lookup(&[
            (ENV_URL, "10.0.0.2:8008"),
            (ENV_KEYFILE, ""),
            (ENV_WAIT, "5"),
        ]))
        .unwrap();
    assert_eq!(cfg.url, "10.0.0.2:8008");
    assert!(cfg.keyfile.is_none());
    assert_eq!(cfg.effective_wait(), Some(Duration::from_secs(5)));

    let cfg = cfg.overlay(lookup(&[(ENV_WAIT, "0")])).unwrap();
    assert_eq!(cfg.wait, Some(Duration::ZERO));
    assert!(cfg.effective_wait().is_none());

    assert!(ClientConfig::default()
        .overlay(lookup(&[(ENV_WAIT, "soon")]))
        .is_err());
    assert!(ClientConfig::default()
        .overlay(lookup(&[(ENV_URL, "a b")]))
        .is_err());
}

#[test]
fn keyfile_location() {
    assert_eq!(
        keyfile_for(Path::new("/home/alice"), "alice"),
        PathBuf::from("/home/alice/.sawtooth/keys/alice.priv")
    );
}
