use reqwest::Url;

use super::ApiError;

pub const LOGIN: &str = "/users/login";
pub const REGISTER: &str = "/users/register";
pub const LOGOUT: &str = "/users/logout";
pub const CURRENT_USER: &str = "/users/me";

pub const ANIMALS_AVAILABLE: &str = "/animals/available";
pub const ANIMALS_ALL: &str = "/animals/all";
pub const ANIMAL_DETAIL: &str = "/animals/{id}";
pub const ANIMAL_SEARCH: &str = "/animals/search";

pub const VOLUNTEER_APPLY: &str = "/volunteers/apply";

pub const DONATE: &str = "/donations/donate";
pub const RECENT_DONATIONS: &str = "/donations/recent";

pub const HEALTH: &str = "/health";

/// Joins an endpoint template onto the base URL. `{name}` segments are taken
/// from `params` and percent-encoded; `query` pairs are appended in order.
pub fn build_url(
    base: &Url,
    template: &str,
    params: &[(&str, &str)],
    query: &[(&str, String)],
) -> Result<Url, ApiError> {
    let mut url = base.clone();
    {
        let mut segments = url.path_segments_mut().map_err(|_| ApiError::InvalidBaseUrl {
            url: base.to_string(),
        })?;
        segments.pop_if_empty();
        for raw in template.split('/').filter(|s| !s.is_empty()) {
            match raw.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
                Some(name) => {
                    let value = params
                        .iter()
                        .find(|(k, _)| *k == name)
                        .map(|(_, v)| *v)
                        .ok_or_else(|| ApiError::MissingPathParam {
                            name: name.to_string(),
                        })?;
                    segments.push(value);
                }
                None => {
                    segments.push(raw);
                }
            }
        }
    }
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
    }
    Ok(url)
}
