// Remote secret store - trait + AWS CLI implementation

use std::io::Write;
use std::process::Command;

use crate::envfile::EnvMap;
use crate::error::Error;

/// Narrow seam to the secrets service: one read, one overwrite.
pub trait SecretStore {
    /// Fetch the current remote mapping for a secret.
    fn fetch(&self, id: &str, region: &str) -> Result<EnvMap, Error>;
    /// Replace the remote secret's value with the given mapping.
    fn put(&self, id: &str, region: &str, payload: &EnvMap) -> Result<(), Error>;
}

/// Talks to AWS Secrets Manager through the `aws` executable, so the whole
/// credential chain (profiles, SSO, instance roles) stays the CLI's problem.
pub struct AwsCliStore;

impl SecretStore for AwsCliStore {
    fn fetch(&self, id: &str, region: &str) -> Result<EnvMap, Error> {
        let output = Command::new("aws")
            .args([
                "secretsmanager",
                "get-secret-value",
                "--secret-id",
                id,
                "--region",
                region,
                "--query",
                "SecretString",
                "--output",
                "text",
            ])
            .output()
            .map_err(|e| Error::RemoteFetch(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::RemoteFetch(stderr.trim().to_string()));
        }

        decode_secret_string(&String::from_utf8_lossy(&output.stdout))
    }

    fn put(&self, id: &str, region: &str, payload: &EnvMap) -> Result<(), Error> {
        let json = serde_json::to_string(payload).map_err(|e| Error::RemoteUpdate(e.to_string()))?;

        // Staged through a process-unique temp file with 0600 permissions.
        // Dropping the handle deletes the file on every path out of here.
        let mut staging =
            tempfile::NamedTempFile::new().map_err(|e| Error::RemoteUpdate(e.to_string()))?;
        staging
            .write_all(json.as_bytes())
            .and_then(|_| staging.flush())
            .map_err(|e| Error::RemoteUpdate(e.to_string()))?;

        let status = Command::new("aws")
            .args([
                "secretsmanager",
                "put-secret-value",
                "--secret-id",
                id,
                "--region",
                region,
                "--secret-string",
                &format!("file://{}", staging.path().display()),
            ])
            .status()
            .map_err(|e| Error::RemoteUpdate(e.to_string()))?;

        if !status.success() {
            return Err(Error::RemoteUpdate(format!("aws exited with {}", status)));
        }
        Ok(())
    }
}

/// The secret value is one JSON object. Values that are not JSON strings are
/// kept in their literal JSON form (`8080`, `true`) rather than rejected.
fn decode_secret_string(raw: &str) -> Result<EnvMap, Error> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| Error::RemoteFetch(format!("invalid JSON payload: {}", e)))?;
    let object = value
        .as_object()
        .ok_or_else(|| Error::RemoteFetch("payload is not a JSON object".to_string()))?;

    let mut vars = EnvMap::new();
    for (key, value) in object {
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        vars.insert(key.clone(), value);
    }
    Ok(vars)
}
