//! [`ObjectStore`] implementation on top of `gcloud storage`.

use serde_json::Value;

use crate::cloud::object_uri;
use crate::cloud::process::run_tool;
use crate::cloud::ObjectStore;
use crate::error::{Error, Result};

/// Talks to Cloud Storage through `gcloud storage`.
#[derive(Debug, Clone)]
pub struct GcsCli {
    program: String,
    project: Option<String>,
}

impl GcsCli {
    pub fn new(project: Option<&str>) -> Self {
        Self {
            program: "gcloud".to_string(),
            project: project.map(str::to_string),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn run(&self, command_args: Vec<String>) -> Result<String> {
        let mut args = vec!["storage".to_string()];
        args.extend(command_args);
        if let Some(project) = &self.project {
            args.push(format!("--project={}", project));
        }
        run_tool(&self.program, &args)
    }

    fn describe(&self, bucket: &str, name: &str) -> Result<Value> {
        let out = self.run(vec![
            "objects".to_string(),
            "describe".to_string(),
            object_uri(bucket, name),
            "--format=json".to_string(),
        ])?;
        Ok(serde_json::from_str(&out)?)
    }
}

fn is_not_found(err: &Error) -> bool {
    match err {
        Error::Tool { stderr, .. } => {
            let stderr = stderr.to_lowercase();
            stderr.contains("not found")
                || stderr.contains("404")
                || stderr.contains("matched no objects")
        }
        _ => false,
    }
}

/// Turn `gcloud storage ls` output into blob names.
pub fn parse_listing(bucket: &str, output: &str) -> Vec<String> {
    let prefix = format!("gs://{}/", bucket);
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix(&prefix))
        .filter(|name| !name.is_empty() && !name.ends_with('/'))
        .map(str::to_string)
        .collect()
}

impl ObjectStore for GcsCli {
    fn exists(&self, bucket: &str, name: &str) -> Result<bool> {
        match self.describe(bucket, name) {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn size(&self, bucket: &str, name: &str) -> Result<u64> {
        let object = self.describe(bucket, name)?;
        let size = match object.get("size") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        };
        size.ok_or_else(|| Error::Response(format!("gcloud storage: no size for {}", name)))
    }

    fn copy(&self, bucket: &str, source: &str, destination: &str) -> Result<()> {
        self.run(vec![
            "cp".to_string(),
            object_uri(bucket, source),
            object_uri(bucket, destination),
        ])?;
        Ok(())
    }

    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let pattern = format!("{}**", object_uri(bucket, prefix));
        match self.run(vec!["ls".to_string(), pattern]) {
            Ok(out) => Ok(parse_listing(bucket, &out)),
            Err(e) if is_not_found(&e) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    fn compose(&self, bucket: &str, sources: &[String], destination: &str) -> Result<()> {
        let mut args = vec!["objects".to_string(), "compose".to_string()];
        args.extend(sources.iter().map(|name| object_uri(bucket, name)));
        args.push(object_uri(bucket, destination));
        self.run(args)?;
        Ok(())
    }

    fn delete(&self, bucket: &str, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        let mut args = vec!["rm".to_string()];
        args.extend(names.iter().map(|name| object_uri(bucket, name)));
        self.run(args)?;
        Ok(())
    }
}
