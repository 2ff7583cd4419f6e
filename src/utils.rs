/// Decode the handful of HTML entities that show up in scraped attributes
pub fn decode_html_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Pick the item whose height is nearest to the requested height, by
/// absolute difference (not "first at-or-above"). Ties go to the lower
/// rendition: a 600 request over {480, 720} yields 480.
pub fn nearest_by_height<T>(
    items: &[T],
    target: u32,
    height: impl Fn(&T) -> u32,
) -> Option<&T> {
    items.iter().min_by(|a, b| {
        let da = height(a).abs_diff(target);
        let db = height(b).abs_diff(target);
        da.cmp(&db).then_with(|| height(a).cmp(&height(b)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_common_entities() {
        assert_eq!(
            decode_html_entities("https://cdn.example/v.mp4?a=1&amp;b=2"),
            "https://cdn.example/v.mp4?a=1&b=2"
        );
        assert_eq!(decode_html_entities("&lt;tag&gt; &quot;x&quot; &#39;y&#39;"), "<tag> \"x\" 'y'");
    }

    #[test]
    fn nearest_minimizes_absolute_difference() {
        let heights = [360u32, 480, 720, 1080];
        assert_eq!(nearest_by_height(&heights, 600, |h| *h), Some(&480));
        assert_eq!(nearest_by_height(&heights, 700, |h| *h), Some(&720));
        assert_eq!(nearest_by_height(&heights, 4000, |h| *h), Some(&1080));
        assert_eq!(nearest_by_height(&heights, 0, |h| *h), Some(&360));
    }

    #[test]
    fn nearest_tie_prefers_the_lower_rendition() {
        // 600 is equidistant from 480 and 720 regardless of list order
        assert_eq!(nearest_by_height(&[1080u32, 720, 480, 360], 600, |h| *h), Some(&480));
    }

    #[test]
    fn nearest_on_empty_slice() {
        assert_eq!(nearest_by_height(&[] as &[u32], 720, |h| *h), None);
    }
}
