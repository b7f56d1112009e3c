//! User-facing progress of a registration run.

use std::fmt;
use std::path::Path;
use std::time::Duration;

/// A step worth telling the operator about.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent<'a> {
    RegisteringManifest {
        path: &'a Path,
    },
    CreatingProvider {
        namespace: &'a str,
    },
    CreatingType {
        namespace: &'a str,
        type_name: &'a str,
    },
    CreatingTypeWithCapabilities {
        namespace: &'a str,
        type_name: &'a str,
        capabilities: &'a [String],
    },
    CreatingApiVersion {
        namespace: &'a str,
        type_name: &'a str,
        version: &'a str,
    },
    CreatingLocation {
        namespace: &'a str,
        location: &'a str,
        address: &'a str,
    },
    UpdatingLocation {
        namespace: &'a str,
        location: &'a str,
    },
    TypeRegistered {
        namespace: &'a str,
        type_name: &'a str,
    },
    Conflict {
        attempt: u32,
        max_attempts: u32,
        error: String,
        wait: Duration,
    },
}

impl fmt::Display for ProgressEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::RegisteringManifest { path } => {
                write!(f, "Registering manifest {}", path.display())
            }
            ProgressEvent::CreatingProvider { namespace } => {
                write!(f, "Creating resource provider {namespace}")
            }
            ProgressEvent::CreatingType { namespace, type_name } => {
                write!(f, "Creating resource type {namespace}/{type_name}")
            }
            ProgressEvent::CreatingTypeWithCapabilities {
                namespace,
                type_name,
                capabilities,
            } => write!(
                f,
                "Creating resource type {namespace}/{type_name} with capabilities {}",
                capabilities.join(",")
            ),
            ProgressEvent::CreatingApiVersion {
                namespace,
                type_name,
                version,
            } => write!(f, "Creating API Version {namespace}/{type_name}@{version}"),
            ProgressEvent::CreatingLocation {
                namespace,
                location,
                address,
            } => write!(f, "Creating location {namespace}/{location}/{address}"),
            ProgressEvent::UpdatingLocation { namespace, location } => {
                write!(f, "Updating location {namespace}/{location} with new resource type")
            }
            ProgressEvent::TypeRegistered { namespace, type_name } => {
                write!(f, "Resource type {namespace}/{type_name} created successfully")
            }
            ProgressEvent::Conflict {
                attempt,
                max_attempts,
                error,
                wait,
            } => write!(
                f,
                "Got 409 conflict on attempt {attempt}/{max_attempts} with error: {error}. Retrying in {wait:?}..."
            ),
        }
    }
}

/// Receives progress events. Implemented for closures.
pub trait Progress: Send + Sync {
    fn report(&self, event: &ProgressEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&self, _event: &ProgressEvent<'_>) {}
}

impl<F> Progress for F
where
    F: Fn(&ProgressEvent<'_>) + Send + Sync,
{
    fn report(&self, event: &ProgressEvent<'_>) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[test]
    fn test_messages() {
        let capabilities = vec!["SupportsRecipes".to_string(), "ManualResourceProvisioning".to_string()];
        let cases = [
            (
                ProgressEvent::CreatingType {
                    namespace: "MyCompany.Resources",
                    type_name: "testResources",
                },
                "Creating resource type MyCompany.Resources/testResources",
            ),
            (
                ProgressEvent::CreatingTypeWithCapabilities {
                    namespace: "MyCompany.Resources",
                    type_name: "testResources",
                    capabilities: &capabilities,
                },
                "Creating resource type MyCompany.Resources/testResources with capabilities SupportsRecipes,ManualResourceProvisioning",
            ),
            (
                ProgressEvent::CreatingApiVersion {
                    namespace: "MyCompany.Resources",
                    type_name: "testResources",
                    version: "2025-01-01-preview",
                },
                "Creating API Version MyCompany.Resources/testResources@2025-01-01-preview",
            ),
            (
                ProgressEvent::CreatingLocation {
                    namespace: "MyCompany.Resources",
                    location: "global",
                    address: "",
                },
                "Creating location MyCompany.Resources/global/",
            ),
            (
                ProgressEvent::Conflict {
                    attempt: 1,
                    max_attempts: 5,
                    error: "busy".to_string(),
                    wait: Duration::from_secs(2),
                },
                "Got 409 conflict on attempt 1/5 with error: busy. Retrying in 2s...",
            ),
        ];

        for (event, expected) in cases {
            assert_eq!(event.to_string(), expected);
        }
    }

    #[test]
    fn test_closure_receives_events() {
        let seen = Mutex::new(Vec::new());
        let progress = |event: &ProgressEvent<'_>| seen.lock().unwrap().push(event.to_string());
        progress.report(&ProgressEvent::CreatingProvider { namespace: "A.B" });
        NoProgress.report(&ProgressEvent::CreatingProvider { namespace: "C.D" });
        assert_eq!(*seen.lock().unwrap(), vec!["Creating resource provider A.B"]);
    }
}
