//! Avatar URL construction.

use postwall_core::Identity;
use url::Url;

/// Builds the fetchable avatar URL for `identity`.
///
/// The form is `{photo_url}?access_token={token}&type={size}`. Query
/// parameters already on the photo URL are kept, the token parameter is left
/// out when there is no token, and an identity without a photo yields an
/// empty reference.
pub fn avatar_url(identity: &Identity, access_token: Option<&str>, size: &str) -> String {
    let Some(photo) = identity.photo_url.as_deref().filter(|p| !p.is_empty()) else {
        return String::new();
    };

    match Url::parse(photo) {
        Ok(mut url) => {
            {
                let mut query = url.query_pairs_mut();
                if let Some(token) = access_token {
                    query.append_pair("access_token", token);
                }
                query.append_pair("type", size);
            }
            url.to_string()
        }
        // Not an absolute URL; append the parameters verbatim.
        Err(_) => {
            let separator = if photo.contains('?') { '&' } else { '?' };
            match access_token {
                Some(token) => format!("{photo}{separator}access_token={token}&type={size}"),
                None => format!("{photo}{separator}type={size}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(photo: &str) -> Identity {
        Identity::new("u1").with_photo_url(photo)
    }

    #[test]
    fn documented_form() {
        assert_eq!(
            avatar_url(
                &identity("https://graph.example.com/123/picture"),
                Some("tok-1"),
                "large"
            ),
            "https://graph.example.com/123/picture?access_token=tok-1&type=large"
        );
    }

    #[test]
    fn keeps_existing_query() {
        assert_eq!(
            avatar_url(&identity("https://cdn.example.com/p?v=2"), Some("t"), "large"),
            "https://cdn.example.com/p?v=2&access_token=t&type=large"
        );
    }

    #[test]
    fn omits_missing_token() {
        assert_eq!(
            avatar_url(&identity("https://cdn.example.com/p"), None, "large"),
            "https://cdn.example.com/p?type=large"
        );
    }

    #[test]
    fn no_photo_means_no_avatar() {
        assert_eq!(avatar_url(&Identity::new("u1"), Some("t"), "large"), "");
        assert_eq!(avatar_url(&identity(""), Some("t"), "large"), "");
    }

    #[test]
    fn relative_reference_is_formatted_verbatim() {
        assert_eq!(
            avatar_url(&identity("avatars/u1.png"), Some("t"), "small"),
            "avatars/u1.png?access_token=t&type=small"
        );
    }
}
