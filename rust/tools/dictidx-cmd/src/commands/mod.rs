//! Command implementations for dictidx-cmd

use anyhow::{Result, bail};
use clap::Args;
use dictidx::index::{AmbiguousPrefixes, SectionIndexParams};

pub mod build;
pub mod build_sections;
pub mod compress;
pub mod dump;
pub mod inspect_dz;
pub mod lookup;
pub mod sort;

/// Section layout options shared by the commands that compute section prefixes.
#[derive(Args, Debug, Clone)]
pub struct SectionArgs {
    /// Folded characters per section prefix (1 to 3)
    #[arg(long, default_value_t = SectionIndexParams::MAX_PREFIX_CHARS)]
    pub prefix_chars: usize,

    /// Named set of ambiguous prefixes: oxford, langdao or none
    #[arg(long)]
    pub preset: Option<String>,

    /// Additional ambiguous prefix, split one character further (repeatable)
    #[arg(long = "ambiguous", value_name = "PREFIX")]
    pub ambiguous: Vec<String>,
}

impl SectionArgs {
    pub fn params(&self) -> Result<SectionIndexParams> {
        let mut prefixes = match &self.preset {
            Some(name) => match AmbiguousPrefixes::preset(name) {
                Some(prefixes) => prefixes,
                None => bail!(
                    "Unknown ambiguous prefix preset '{name}' (expected oxford, langdao or none)"
                ),
            },
            None => AmbiguousPrefixes::default(),
        };
        prefixes.extend(&self.ambiguous);
        Ok(SectionIndexParams {
            prefix_chars: self.prefix_chars,
            ..Default::default()
        }
        .with_ambiguous_prefixes(prefixes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_args() {
        let args = SectionArgs {
            prefix_chars: 2,
            preset: Some("oxford".to_string()),
            ambiguous: vec!["Zoo".to_string()],
        };
        let params = args.params().unwrap();
        assert_eq!(params.prefix_chars, 2);
        assert!(params.ambiguous_prefixes.contains(b"con"));
        assert!(params.ambiguous_prefixes.contains(b"zoo"));

        let args = SectionArgs {
            prefix_chars: 3,
            preset: Some("webster".to_string()),
            ambiguous: vec![],
        };
        assert!(args.params().is_err());
    }
}
