use semver::Version;

/// `vergen` writes this placeholder when it can't reach git.
const IDEMPOTENT_SHA: &str = "VERGEN_IDEMPOTENT_OUTPUT";

pub fn get_version() -> String {
    format_version(env!("CARGO_PKG_VERSION"), env!("VERGEN_GIT_SHA"))
}

fn format_version(pkg_version: &str, sha: &str) -> String {
    let Ok(semver) = pkg_version.parse::<Version>() else {
        tracing::warn!(
            pkg_version,
            "couldn't parse a semver out of Cargo.toml? defaulting to 0.0.0-unknown."
        );
        return String::from("0.0.0-unknown");
    };

    if sha.is_empty() || sha == IDEMPOTENT_SHA {
        semver.to_string()
    } else {
        let short = sha.get(..7).unwrap_or(sha);
        format!("{semver} (`{short}`)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_short_sha() {
        assert_eq!(
            format_version("2026.10.1", "0123456789abcdef"),
            "2026.10.1 (`0123456`)"
        );
    }

    #[test]
    fn omits_placeholder_sha() {
        assert_eq!(format_version("1.2.3", IDEMPOTENT_SHA), "1.2.3");
        assert_eq!(format_version("1.2.3", ""), "1.2.3");
    }

    #[test]
    fn falls_back_on_bad_semver() {
        assert_eq!(format_version("not-a-version", "abc"), "0.0.0-unknown");
    }
}
