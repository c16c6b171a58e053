use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::enterprise::EnterpriseOptions;
use crate::error::{Error, Result};
use crate::product::Product;

static PRODUCT_NAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());
static BINARY_NAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[.a-zA-Z0-9\-_]+$").unwrap());

pub fn is_product_name_valid(name: &str) -> bool { PRODUCT_NAME_REGEX.is_match(name) }

pub fn is_binary_name_valid(name: &str) -> bool { BINARY_NAME_REGEX.is_match(name) }

pub fn validate_product(product: &Product) -> Result<()> {
    if !is_product_name_valid(&product.name) {
        return Err(Error::validation("product.name", format!("invalid product name: {:?}", product.name)));
    }
    let binary = product.binary_name();
    if !is_binary_name_valid(&binary) {
        return Err(Error::validation("product.binary_name", format!("invalid binary name: {binary:?}")));
    }
    Ok(())
}

pub fn validate_enterprise_options(enterprise: Option<&EnterpriseOptions>, license_dir: Option<&Path>) -> Result<()> {
    if enterprise.is_none() {
        return Ok(());
    }
    match license_dir {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(()),
        _ => Err(Error::validation(
            "license_dir",
            "license dir must be provided when requesting enterprise versions",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::OPEN_TOFU;
    use std::borrow::Cow;

    #[test]
    fn product_names() {
        for ok in ["tofu", "vault", "consul-template", "x1"] {
            assert!(is_product_name_valid(ok), "{ok}");
        }
        for bad in ["", "Tofu", "tofu_x", "tofu/..", "a b"] {
            assert!(!is_product_name_valid(bad), "{bad}");
        }
    }

    #[test]
    fn binary_names() {
        for ok in ["tofu", "tofu.exe", "my_tool-2", ".hidden"] {
            assert!(is_binary_name_valid(ok), "{ok}");
        }
        for bad in ["", "bin/tofu", "to fu", "..\\x"] {
            assert!(!is_binary_name_valid(bad), "{bad}");
        }
    }

    #[test]
    fn product_errors_name_the_field() {
        let product = Product {
            name: Cow::Borrowed("Bad Name"),
            ..OPEN_TOFU
        };
        match validate_product(&product).unwrap_err() {
            Error::Validation { field, message } => {
                assert_eq!(field, "product.name");
                assert_eq!(message, r#"invalid product name: "Bad Name""#);
            }
            other => panic!("unexpected {other:?}"),
        }

        fn slashed() -> String { "bin/tofu".into() }
        let product = Product {
            binary_name: slashed,
            ..OPEN_TOFU
        };
        let err = validate_product(&product).unwrap_err();
        assert_eq!(err.to_string(), r#"invalid binary name: "bin/tofu""#);
    }

    #[test]
    fn enterprise_requires_license_dir() {
        let ent = EnterpriseOptions::default();
        validate_enterprise_options(None, None).unwrap();
        validate_enterprise_options(Some(&ent), Some(Path::new("/licenses"))).unwrap();

        for dir in [None, Some(Path::new(""))] {
            let err = validate_enterprise_options(Some(&ent), dir).unwrap_err();
            assert_eq!(err.to_string(), "license dir must be provided when requesting enterprise versions");
        }
    }
}
