//! Breed-text category inference.
//!
//! Advisory classification used for browse filters; the authoritative
//! category remains whatever the submitter picked on the form. Matching is
//! case-insensitive substring containment against two fixed keyword lists,
//! dog terms checked before cat terms so ambiguous breeds resolve to dog.

use super::domain::PetCategory;

const DOG_BREED_TERMS: &[&str] = &[
    "dog",
    "puppy",
    "labrador",
    "retriever",
    "golden",
    "german shepherd",
    "husky",
    "rottweiler",
    "doberman",
    "poodle",
    "bulldog",
    "beagle",
    "dachshund",
    "boxer",
    "dalmatian",
    "spaniel",
    "pomeranian",
    "terrier",
    "yorkshire",
    "maltese",
    "shih tzu",
    "pug",
    "corgi",
    "shepherd",
    "great dane",
    "mastiff",
    "collie",
    "schnauzer",
    "samoyed",
    "shiba",
    "german",
    "aspin",
    "mixed",
    "affenpinscher",
    "akita",
    "american bulldog",
    "australian shepherd",
    "bernese mountain dog",
    "chihuahua",
];

const CAT_BREED_TERMS: &[&str] = &[
    "cat",
    "kitten",
    "persian",
    "siamese",
    "tabby",
    "ragdoll",
    "maine coon",
    "bengal",
    "sphynx",
    "burmese",
    "birman",
    "abyssinian",
    "tonkinese",
    "calico",
    "angora",
    "balinese",
    "himalayan",
    "scottish fold",
    "devon rex",
    "domestic shorthair",
    "domestic longhair",
    "puspin",
    "mixed",
    "exotic shorthair",
    "chinchilla",
    "siberian",
];

/// Classify a free-text breed into a browse category. Unmatched or empty
/// input lands in the catch-all bucket.
pub fn category_for_breed(breed: &str) -> PetCategory {
    let lowered = breed.trim().to_lowercase();
    if lowered.is_empty() {
        return PetCategory::Other;
    }
    if DOG_BREED_TERMS.iter().any(|term| lowered.contains(term)) {
        return PetCategory::Dog;
    }
    if CAT_BREED_TERMS.iter().any(|term| lowered.contains(term)) {
        return PetCategory::Cat;
    }
    PetCategory::Other
}
