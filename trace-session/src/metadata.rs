//! Session metadata assembly
//!
//! Runs once before the first frame is written. Every failure here aborts
//! the session: the metadata record cannot be amended later.

use crate::args::split_args;
use crate::config::TracerIdentity;
use crate::error::SessionError;
use crate::host::HostEnv;
use crate::resolve::resolve_target;
use frame_tracer::{SessionMetadata, TargetInfo, TracerInfo};

/// Builds [`SessionMetadata`] from the process argv and environment
pub struct MetadataBuilder<'a, H: HostEnv> {
    host: &'a H,
    tracer: TracerIdentity,
}

impl<'a, H: HostEnv> MetadataBuilder<'a, H> {
    pub fn new(host: &'a H, tracer: TracerIdentity) -> Self {
        Self { host, tracer }
    }

    /// Assemble the metadata record
    ///
    /// # Arguments
    /// * `argv` - Full process argv: tracer arguments, `--`, target command line
    /// * `envp` - Environment snapshot as `KEY=VALUE` entries
    pub fn build(&self, argv: &[String], envp: &[String]) -> Result<SessionMetadata, SessionError> {
        let split = split_args(argv, envp).ok_or(SessionError::MissingTarget)?;
        let path = resolve_target(self.host, &split.target)?;

        let digest = self.host.digest(&path).map_err(|source| SessionError::Hash {
            path: path.clone(),
            source,
        })?;
        let fstats = self.host.stat(&path).map_err(|source| SessionError::Stat {
            path: path.clone(),
            source,
        })?;

        let user = self.host.login_name().map_err(SessionError::LoginName)?;
        let host = self.host.hostname().map_err(SessionError::Hostname)?;
        let time = self.host.now().ok_or(SessionError::Clock)?;

        let metadata = SessionMetadata {
            tracer: TracerInfo {
                name: self.tracer.name.clone(),
                version: self.tracer.version.clone(),
                args: split.tracer_args,
                envp: envp.to_vec(),
            },
            target: TargetInfo {
                path: path.to_string_lossy().into_owned(),
                args: split.target_args,
                envp: envp.to_vec(),
                digest,
            },
            fstats,
            user,
            host,
            time,
        };

        tracing::info!("Session metadata: {}", metadata);
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::tests::FakeHost;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn tracer() -> TracerIdentity {
        TracerIdentity { name: "bpt".into(), version: "1.0.0".into() }
    }

    #[test]
    fn test_build_metadata() {
        let host = FakeHost::new(&["/b/foo"]);
        let argv = strings(&["tracer", "-o", "t.out", "--", "foo", "arg1"]);
        let envp = strings(&["HOME=/home/alice"]);

        let meta = MetadataBuilder::new(&host, tracer()).build(&argv, &envp).unwrap();

        assert_eq!(meta.tracer.name, "bpt");
        assert_eq!(meta.tracer.version, "1.0.0");
        assert_eq!(meta.tracer.args, strings(&["tracer", "-o", "t.out"]));
        assert_eq!(meta.tracer.envp, envp);

        assert_eq!(meta.target.path, "/b/foo");
        // argv[0] keeps the name as typed, not the resolved path
        assert_eq!(meta.target.args, strings(&["foo", "arg1"]));
        assert_eq!(meta.target.envp, envp);
        assert_eq!(meta.target.digest, vec![0xab; 32]);

        assert_eq!(meta.fstats.size, 42);
        assert_eq!(meta.user, "alice");
        assert_eq!(meta.host, "buildbox");
        assert_eq!(meta.time, 1_700_000_000);
    }

    #[test]
    fn test_missing_target() {
        let host = FakeHost::new(&[]);
        let err = MetadataBuilder::new(&host, tracer())
            .build(&strings(&["tracer", "--"]), &[])
            .unwrap_err();
        assert!(matches!(err, SessionError::MissingTarget));
    }

    #[test]
    fn test_target_not_found() {
        let host = FakeHost::new(&["/c/foo"]);
        let err = MetadataBuilder::new(&host, tracer())
            .build(&strings(&["tracer", "--", "foo"]), &[])
            .unwrap_err();
        assert!(matches!(err, SessionError::TargetNotFound { .. }));
    }

    #[test]
    fn test_missing_login_is_fatal() {
        let mut host = FakeHost::new(&["/a/foo"]);
        host.login = None;
        let err = MetadataBuilder::new(&host, tracer())
            .build(&strings(&["tracer", "--", "foo"]), &[])
            .unwrap_err();
        assert!(matches!(err, SessionError::LoginName(_)));
    }

    #[test]
    fn test_fallback_without_separator() {
        // without "--" the target slot is the first environment entry
        let host = FakeHost::new(&["/work/prog"]);
        let argv = strings(&["tracer", "x"]);
        let envp = strings(&["prog", "HOME=/root"]);

        let meta = MetadataBuilder::new(&host, tracer()).build(&argv, &envp).unwrap();
        assert_eq!(meta.tracer.args, argv);
        assert!(meta.target.args.is_empty());
        assert_eq!(meta.target.path, "/work/prog");
    }
}
