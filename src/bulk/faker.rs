//! Plausible fake contact details for synthetic customers.

use rand::Rng;
use rand::seq::SliceRandom;

const FIRST_NAMES: &[&str] = &[
    "Aaliyah", "Abel", "Ada", "Adrian", "Aiden", "Alana", "Albert", "Alice", "Amara", "Amelia",
    "Andre", "Angela", "Ann", "Arthur", "Aurora", "Beatrice", "Benjamin", "Bianca", "Caleb",
    "Camila", "Carlos", "Caroline", "Cecilia", "Charles", "Chloe", "Clara", "Daniel", "Delia",
    "Diego", "Dorothy", "Edgar", "Eleanor", "Elena", "Elias", "Emma", "Ethan", "Felix", "Fiona",
    "Gabriel", "Grace", "Hannah", "Harvey", "Hazel", "Henry", "Iris", "Isaac", "Ivy", "Jack",
    "Jasmine", "Julian", "June", "Kai", "Laura", "Leo", "Lila", "Lucas", "Mabel", "Marcus",
    "Maya", "Miles", "Nadia", "Noah", "Nora", "Oliver", "Olivia", "Oscar", "Penelope", "Quinn",
    "Rosa", "Samuel", "Sofia", "Theo", "Uma", "Victor", "Violet", "Wesley", "Willow", "Zoe",
];

const LAST_NAMES: &[&str] = &[
    "Abbott", "Alvarez", "Bailey", "Barnes", "Bartell", "Bauer", "Bechtelar", "Brooks",
    "Carter", "Castillo", "Collins", "Cruz", "Daniels", "Dietrich", "Douglas", "Ellis",
    "Erdman", "Fisher", "Flores", "Gibson", "Gleason", "Graham", "Hahn", "Hansen", "Hayes",
    "Hughes", "Jenkins", "Keeling", "Kim", "Koelpin", "Larson", "Lind", "Marsh", "Mills",
    "Morales", "Murphy", "Nguyen", "Nolan", "Ortiz", "Parker", "Patel", "Quigley", "Reyes",
    "Rogahn", "Ross", "Sanford", "Schmidt", "Shaw", "Stone", "Tran", "Turner", "Vance",
    "Walsh", "Ward", "Wolff", "Young", "Zieme",
];

const STREET_SUFFIXES: &[&str] = &[
    "Avenue", "Bypass", "Court", "Crossing", "Drive", "Estates", "Fields", "Gardens", "Grove",
    "Heights", "Lane", "Mill", "Parkway", "Place", "Ridge", "Road", "Square", "Street", "Trail",
    "Way",
];

const EMAIL_DOMAINS: &[&str] = &[
    "example.com", "example.net", "example.org", "mail.test", "inbox.test",
];

const PHONE_FORMATS: &[&str] = &[
    "(###) ###-####",
    "###-###-####",
    "###.###.####",
    "1-###-###-####",
    "###-###-#### x###",
];

/// One synthetic set of contact fields.
#[derive(Debug, Clone)]
pub struct FakeProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub contact_number: String,
    pub address: String,
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, values: &'a [&'a str]) -> &'a str {
    values.choose(rng).copied().unwrap_or_default()
}

fn phone_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    pick(rng, PHONE_FORMATS)
        .chars()
        .map(|ch| {
            if ch == '#' {
                char::from(b'0' + rng.gen_range(0..10u8))
            } else {
                ch
            }
        })
        .collect()
}

impl FakeProfile {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let first_name = pick(rng, FIRST_NAMES).to_string();
        let last_name = pick(rng, LAST_NAMES).to_string();
        let email = format!(
            "{}.{}{}@{}",
            first_name.to_lowercase(),
            last_name.to_lowercase(),
            rng.gen_range(1..10_000u32),
            pick(rng, EMAIL_DOMAINS)
        );
        let address = format!(
            "{} {} {}",
            rng.gen_range(1..9_999u32),
            pick(rng, LAST_NAMES),
            pick(rng, STREET_SUFFIXES)
        );

        Self {
            first_name,
            last_name,
            email,
            contact_number: phone_number(rng),
            address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numbers_have_no_placeholders() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let number = phone_number(&mut rng);
            assert!(!number.contains('#'));
            assert!(number.chars().filter(|c| c.is_ascii_digit()).count() >= 10);
        }
    }

    #[test]
    fn email_is_derived_from_names() {
        let mut rng = rand::thread_rng();
        let profile = FakeProfile::generate(&mut rng);
        let local = profile.email.split('@').next().unwrap();
        assert!(local.starts_with(&format!(
            "{}.{}",
            profile.first_name.to_lowercase(),
            profile.last_name.to_lowercase()
        )));
        assert!(!profile.address.is_empty());
    }
}
