// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates cfship.yml template files.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

pub fn init_config(dir: &Path, endpoint: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(e) = endpoint {
        let url = url::Url::parse(e).map_err(|err| Error::InvalidConfig(err.to_string()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::InvalidConfig(format!(
                "endpoint must be http or https: {e}"
            )));
        }
        config.api.endpoint = e.trim_end_matches('/').to_string();
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"api:
  endpoint: {}
  token:
    env: CF_TOKEN
# skip_ssl_validation: false
# polling:
#   interval: 5s
#   staging_timeout: 15m
# deploy:
#   no_blue_green_deploy: false
#   no_blue_green_restage: false
"#,
        config.api.endpoint
    )
}
