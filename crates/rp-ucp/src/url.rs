//! Resource addresses on the control plane.

use std::fmt;

use reqwest::Url;

const API_PREFIX: [&str; 5] = ["apis", "api.ucp.dev", "v1alpha3", "planes", "radius"];
const RESOURCE_PROVIDERS: [&str; 3] = ["providers", "System.Resources", "resourceproviders"];

/// A resource below a resource provider, or the provider itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourcePath<'a> {
    Provider {
        provider: &'a str,
    },
    ResourceType {
        provider: &'a str,
        type_name: &'a str,
    },
    ApiVersion {
        provider: &'a str,
        type_name: &'a str,
        version: &'a str,
    },
    Location {
        provider: &'a str,
        location: &'a str,
    },
}

impl<'a> ResourcePath<'a> {
    /// Path segments below the plane, unescaped.
    pub fn segments(&self) -> Vec<&'a str> {
        let mut segments = RESOURCE_PROVIDERS.to_vec();
        match *self {
            ResourcePath::Provider { provider } => segments.push(provider),
            ResourcePath::ResourceType { provider, type_name } => {
                segments.extend([provider, "resourcetypes", type_name]);
            }
            ResourcePath::ApiVersion {
                provider,
                type_name,
                version,
            } => segments.extend([provider, "resourcetypes", type_name, "apiversions", version]),
            ResourcePath::Location { provider, location } => {
                segments.extend([provider, "locations", location]);
            }
        }
        segments
    }

    /// The full request URL for this resource on `plane`.
    ///
    /// Every name is pushed as its own percent-encoded segment, so reserved
    /// characters cannot change the path or the query.
    pub fn url(&self, endpoint: &Url, plane: &str, api_version: &str) -> Url {
        let mut url = endpoint.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(API_PREFIX)
                .push(plane)
                .extend(self.segments());
        }
        url.query_pairs_mut().append_pair("api-version", api_version);
        url
    }
}

impl fmt::Display for ResourcePath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments().join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VERSION: &str = "2023-10-01-preview";

    fn endpoint(value: &str) -> Url {
        Url::parse(value).unwrap()
    }

    #[test]
    fn test_provider_url() {
        let path = ResourcePath::Provider {
            provider: "MyCompany.Resources",
        };
        assert_eq!(
            path.url(&endpoint("http://localhost:9000/"), "local", VERSION).as_str(),
            "http://localhost:9000/apis/api.ucp.dev/v1alpha3/planes/radius/local/providers/System.Resources/resourceproviders/MyCompany.Resources?api-version=2023-10-01-preview"
        );
    }

    #[test]
    fn test_endpoint_path_prefix_is_kept() {
        let path = ResourcePath::Provider { provider: "A.B" };
        assert_eq!(
            path.url(&endpoint("https://gateway.example/ucp"), "local", VERSION).as_str(),
            "https://gateway.example/ucp/apis/api.ucp.dev/v1alpha3/planes/radius/local/providers/System.Resources/resourceproviders/A.B?api-version=2023-10-01-preview"
        );
    }

    #[test]
    fn test_reserved_characters_are_escaped() {
        let path = ResourcePath::Location {
            provider: "A.B",
            location: "east?x=1#frag",
        };
        let url = path.url(&endpoint("http://h"), "local", "v");
        assert_eq!(
            url.path(),
            "/apis/api.ucp.dev/v1alpha3/planes/radius/local/providers/System.Resources/resourceproviders/A.B/locations/east%3Fx=1%23frag"
        );
        assert_eq!(url.query(), Some("api-version=v"));
        assert_eq!(url.fragment(), None);

        let path = ResourcePath::ResourceType {
            provider: "A.B",
            type_name: "a/b",
        };
        assert!(path.url(&endpoint("http://h"), "local", "v").path().ends_with("/resourcetypes/a%2Fb"));
    }

    #[test]
    fn test_nested_paths() {
        assert_eq!(
            ResourcePath::ApiVersion {
                provider: "A.B",
                type_name: "widgets",
                version: "2025-01-01",
            }
            .to_string(),
            "providers/System.Resources/resourceproviders/A.B/resourcetypes/widgets/apiversions/2025-01-01"
        );
        assert_eq!(
            ResourcePath::Location {
                provider: "A.B",
                location: "global",
            }
            .to_string(),
            "providers/System.Resources/resourceproviders/A.B/locations/global"
        );
    }
}
