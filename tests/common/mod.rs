#![allow(dead_code)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use dtdd_orchestrator::OrchestratorConfig;
use tempfile::TempDir;

// Stands in for `docker`. Anchor containers are directories under `state/`,
// `run` executes the given program on the host with the volume directory in
// `FAKE_VOLUME_DIR`, and every invocation is appended to `invocations.log`.
const FAKE_ENGINE: &str = r#"#!/bin/sh
root="$(cd "$(dirname "$0")/.." && pwd)"
state="$root/state"
mkdir -p "$state"
echo "$*" >> "$root/invocations.log"
cmd="$1"
shift
case "$cmd" in
build)
    echo "Step 1/1 : FROM scratch"
    echo "Successfully tagged $2"
    ;;
create)
    mkdir "$state/$4" || exit 1
    echo "$4"
    ;;
run)
    mounts=""
    while [ $# -gt 0 ]; do
        case "$1" in
        --rm) shift ;;
        --volumes-from) FAKE_VOLUME_DIR="$state/$2"; export FAKE_VOLUME_DIR; shift 2 ;;
        -v) mounts="$2"; shift 2 ;;
        *) break ;;
        esac
    done
    FAKE_MOUNT="$mounts"
    export FAKE_MOUNT
    # image tag
    shift
    exec sh "$@"
    ;;
cp)
    name="${1%%:*}"
    inner="${1#*:}"
    cp "$state/$name${inner#/data}" "$2"
    ;;
rm)
    [ -d "$state/$2" ] || exit 1
    rm -r "$state/$2"
    ;;
*)
    echo "unsupported command $cmd" >&2
    exit 2
    ;;
esac
"#;

pub const PRODUCER_OK: &str = r#"out="${1#--output=}"
echo "fetching movies"
printf '%s' '{"title":"X"}' > "$FAKE_VOLUME_DIR${out#/data}"
echo "done"
"#;

pub const PRODUCER_FAIL: &str = r#"echo "fetching movies"
echo "rate limited" >&2
exit 7
"#;

// exits successfully without leaving an artifact, so extraction fails
pub const PRODUCER_NOTHING: &str = "echo \"nothing to do\"\n";

pub const CONSUMER: &str = r#"echo "$FAKE_MOUNT $*" >> "$(dirname "$0")/../consumed.log"
echo "Writing update values to Plex"
"#;

pub struct FakeEngine {
    pub root: TempDir,
}

impl FakeEngine {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("bin")).unwrap();
        fs::create_dir(root.path().join("work")).unwrap();
        fs::create_dir(root.path().join("user")).unwrap();
        let engine = root.path().join("bin/docker");
        fs::write(&engine, FAKE_ENGINE).unwrap();
        fs::set_permissions(&engine, fs::Permissions::from_mode(0o755)).unwrap();
        for (name, contents) in [
            ("producer_ok.sh", PRODUCER_OK),
            ("producer_fail.sh", PRODUCER_FAIL),
            ("producer_nothing.sh", PRODUCER_NOTHING),
            ("consumer.sh", CONSUMER),
        ] {
            fs::write(root.path().join("bin").join(name), contents).unwrap();
        }
        Self { root }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn work_dir(&self) -> PathBuf {
        self.path().join("work")
    }

    pub fn script(&self, name: &str) -> String {
        self.path().join("bin").join(name).display().to_string()
    }

    pub fn config(&self) -> OrchestratorConfig {
        OrchestratorConfig::default()
            .engine(self.script("docker"))
            .work_dir(self.work_dir())
            .producer(self.script("producer_ok.sh"))
            .consumer(self.script("consumer.sh"))
    }

    /// Writes an active config.py into the work dir
    pub fn with_active_config(self) -> Self {
        fs::write(self.work_dir().join("config.py"), "PLEX_URL = 'active'\n").unwrap();
        self
    }

    /// Every engine invocation so far, one line each
    pub fn invocations(&self) -> Vec<String> {
        match fs::read_to_string(self.path().join("invocations.log")) {
            Ok(log) => log.lines().map(str::to_owned).collect(),
            Err(_) => vec![],
        }
    }

    /// Anchor containers that have not been removed
    pub fn leftover_volumes(&self) -> Vec<String> {
        match fs::read_dir(self.path().join("state")) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => vec![],
        }
    }

    pub fn consumed(&self) -> Vec<String> {
        match fs::read_to_string(self.path().join("consumed.log")) {
            Ok(log) => log.lines().map(str::to_owned).collect(),
            Err(_) => vec![],
        }
    }
}
