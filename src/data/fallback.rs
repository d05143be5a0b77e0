//! Placeholder dataset used when the API cannot be reached.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use super::model::ConversationPoint;

pub const SAMPLE_EMAILS: [&str; 6] = [
    "alice@company.com",
    "bob@startup.io",
    "charlie@tech.org",
    "diana@research.edu",
    "eve@design.co",
    "frank@dev.net",
];

pub const SAMPLE_TITLES: [&str; 8] = [
    "Project Planning Discussion",
    "Feature Implementation Review",
    "Bug Fix Strategy",
    "User Experience Feedback",
    "Performance Analysis",
    "Security Implementation",
    "Database Optimization",
    "API Design",
];

pub const SAMPLE_CLUSTER_TITLES: [&str; 6] = [
    "Development & Coding",
    "Project Management",
    "Design & UX",
    "Security & Performance",
    "Business Strategy",
    "Technical Support",
];

pub const CLUSTER_CENTERS: usize = 150;
const CENTER_EXTENT: f32 = 20.0;
const SPREAD: f32 = 6.0;
const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

/// Generates clumps of points around random centres, one owner and one
/// cluster per clump. Timestamps fall within the year before `now_unix`.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, now_unix: u64) -> Vec<ConversationPoint> {
    let mut points = Vec::with_capacity(CLUSTER_CENTERS * 4);

    for _ in 0..CLUSTER_CENTERS {
        let center = [
            (rng.random::<f32>() - 0.5) * CENTER_EXTENT,
            (rng.random::<f32>() - 0.5) * CENTER_EXTENT,
            (rng.random::<f32>() - 0.5) * CENTER_EXTENT,
        ];
        let email = SAMPLE_EMAILS[rng.random_range(0..SAMPLE_EMAILS.len())];
        let cluster = rng.random_range(0..SAMPLE_CLUSTER_TITLES.len());

        for _ in 0..rng.random_range(2..=6) {
            let age = rng.random_range(0..SECONDS_PER_YEAR);
            points.push(ConversationPoint {
                x: center[0] + (rng.random::<f32>() - 0.5) * SPREAD,
                y: center[1] + (rng.random::<f32>() - 0.5) * SPREAD,
                z: center[2] + (rng.random::<f32>() - 0.5) * SPREAD,
                email: email.to_string(),
                title: SAMPLE_TITLES[rng.random_range(0..SAMPLE_TITLES.len())].to_string(),
                timestamp: format_iso8601(now_unix.saturating_sub(age)),
                cluster_id: Some(cluster as u32),
                cluster_title: Some(SAMPLE_CLUSTER_TITLES[cluster].to_string()),
                body: None,
            });
        }
    }

    points
}

/// [`generate`] anchored at the current wall clock.
pub fn generate_now<R: Rng + ?Sized>(rng: &mut R) -> Vec<ConversationPoint> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    generate(rng, now)
}

/// Formats seconds since the Unix epoch as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_iso8601(unix_secs: u64) -> String {
    let days = (unix_secs / 86_400) as i64;
    let secs_of_day = unix_secs % 86_400;
    let (year, month, day) = civil_from_days(days);
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}Z",
        secs_of_day / 3600,
        (secs_of_day / 60) % 60,
        secs_of_day % 60
    )
}

// Days since 1970-01-01 to a proleptic Gregorian date.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn iso_formatting() {
        assert_eq!(format_iso8601(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_iso8601(951_782_400), "2000-02-29T00:00:00Z");
        assert_eq!(format_iso8601(1_700_000_000), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn generated_points_stay_near_their_centres() {
        let mut rng = StdRng::seed_from_u64(7);
        let points = generate(&mut rng, 1_700_000_000);

        assert!(points.len() >= CLUSTER_CENTERS * 2);
        assert!(points.len() <= CLUSTER_CENTERS * 6);
        for p in &points {
            for c in p.position() {
                assert!(c.abs() <= 13.0, "coordinate {c} out of range");
            }
            assert!(SAMPLE_EMAILS.contains(&p.email.as_str()));
            let cluster = p.cluster_id.unwrap() as usize;
            assert_eq!(p.cluster_title.as_deref(), Some(SAMPLE_CLUSTER_TITLES[cluster]));
            assert!(p.timestamp.as_str() <= "2023-11-14T22:13:20Z");
            assert!(p.timestamp.as_str() >= "2022-11-14T22:13:20Z");
        }
    }

    #[test]
    fn same_seed_same_dataset() {
        let a = generate(&mut StdRng::seed_from_u64(3), 1_700_000_000);
        let b = generate(&mut StdRng::seed_from_u64(3), 1_700_000_000);
        assert_eq!(a, b);
    }
}
