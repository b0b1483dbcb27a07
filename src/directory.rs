use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::Counsellor;

pub const SUGGESTION_COUNT: usize = 2;

pub fn seed_counsellors() -> Vec<Counsellor> {
    [
        (
            "Dr. Ayesha Khan",
            "Clinical Psychologist",
            "ayesha.khan@example.com",
            "+91 98765 43210",
        ),
        (
            "Dr. Rajiv Mehta",
            "Counseling Psychologist",
            "rajiv.mehta@example.com",
            "+91 99887 66554",
        ),
        (
            "Dr. Priya Sharma",
            "Anxiety & Stress",
            "priya.sharma@example.com",
            "+91 98123 45678",
        ),
        (
            "Dr. Arjun Nair",
            "Mood Disorders",
            "arjun.nair@example.com",
            "+91 91234 56789",
        ),
    ]
    .into_iter()
    .map(|(name, specialty, email, phone)| Counsellor {
        name: name.to_string(),
        specialty: specialty.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        booking_url: format!("https://calendly.com/{}", email.split('@').next().unwrap_or(email)),
    })
    .collect()
}

/// Up to `count` distinct counsellors, chosen uniformly.
pub fn suggest<R: Rng + ?Sized>(
    counsellors: &[Counsellor],
    count: usize,
    rng: &mut R,
) -> Vec<Counsellor> {
    counsellors.choose_multiple(rng, count).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn suggestions_are_distinct() {
        let directory = seed_counsellors();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let picks = suggest(&directory, SUGGESTION_COUNT, &mut rng);
            assert_eq!(picks.len(), 2);
            assert_ne!(picks[0].email, picks[1].email);
        }
    }

    #[test]
    fn small_directory_returns_what_it_has() {
        let directory = seed_counsellors();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(suggest(&directory[..1], 2, &mut rng).len(), 1);
        assert!(suggest(&[], 2, &mut rng).is_empty());
    }

    #[test]
    fn seed_entries_have_booking_links() {
        for counsellor in seed_counsellors() {
            assert!(counsellor.booking_url.starts_with("https://"));
        }
    }
}
