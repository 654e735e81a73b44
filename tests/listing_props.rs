use paws::listing::{filter_records, total_pages, FilterCriteria, ListController, PageWindow};
use paws::models::Animal;
use proptest::prelude::*;
use proptest::test_runner::Config;

fn pick(options: &'static [&'static str]) -> impl Strategy<Value = String> {
    proptest::sample::select(options).prop_map(str::to_string)
}

fn animal() -> impl Strategy<Value = Animal> {
    (
        pick(&["dog", "cat", "other"]),
        pick(&["Beagle", "Mixed Breed", "Golden Retriever", "Siamese"]),
        pick(&["small", "medium", "large"]),
        pick(&["Kowloon", "Central", "Oslo"]),
        pick(&["Male", "Female"]),
        any::<bool>(),
        proptest::collection::vec(pick(&["Playful", "Calm", "Curious"]), 0..3),
    )
        .prop_map(
            |(kind, breed, size, location, gender, neutered, personality)| Animal {
                name: format!("{breed} {kind}"),
                kind,
                breed,
                size,
                location,
                gender,
                neutered,
                personality,
                ..Animal::default()
            },
        )
}

fn records() -> impl Strategy<Value = Vec<Animal>> {
    proptest::collection::vec(animal(), 0..40).prop_map(|mut records| {
        for (i, r) in records.iter_mut().enumerate() {
            r.id = i.to_string();
        }
        records
    })
}

fn criteria() -> impl Strategy<Value = FilterCriteria> {
    (
        proptest::option::of(pick(&["dog", "cat", "other"])),
        proptest::option::of(pick(&["beagle", "mixed", "retriever"])),
        proptest::option::of(pick(&["small", "medium", "large"])),
        proptest::option::of(pick(&["kowloon", "oslo"])),
        proptest::option::of(pick(&["male", "female"])),
        proptest::option::of(pick(&["yes", "no"])),
        proptest::option::of(pick(&["playful", "calm"])),
        proptest::option::of(pick(&["e", "an", "gold", " "])),
    )
        .prop_map(
            |(animal_type, breed, size, location, gender, neutered, personality, search)| {
                FilterCriteria {
                    animal_type,
                    breed,
                    size,
                    location,
                    gender,
                    neutered,
                    personality,
                    search,
                    ..FilterCriteria::default()
                }
            },
        )
}

/// Keeps every constraint of `base` and fills its gaps from `extra`.
fn tighten(base: &FilterCriteria, extra: FilterCriteria) -> FilterCriteria {
    FilterCriteria {
        animal_type: base.animal_type.clone().or(extra.animal_type),
        breed: base.breed.clone().or(extra.breed),
        age: base.age.clone().or(extra.age),
        gender: base.gender.clone().or(extra.gender),
        size: base.size.clone().or(extra.size),
        location: base.location.clone().or(extra.location),
        neutered: base.neutered.clone().or(extra.neutered),
        personality: base.personality.clone().or(extra.personality),
        search: base.search.clone().or(extra.search),
    }
}

fn ids(found: &[&Animal]) -> Vec<String> {
    found.iter().map(|a| a.id.clone()).collect()
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn stricter_criteria_keep_a_subsequence(
        catalog in records(),
        loose in criteria(),
        extra in criteria(),
    ) {
        let strict = tighten(&loose, extra);
        let wide = ids(&filter_records(&catalog, &loose));
        let narrow = ids(&filter_records(&catalog, &strict));

        prop_assert!(narrow.len() <= wide.len());
        let mut rest = wide.iter();
        for id in &narrow {
            prop_assert!(rest.any(|w| w == id), "{id} missing or out of order");
        }
    }

    #[test]
    fn filtering_preserves_load_order(catalog in records(), c in criteria()) {
        let found: Vec<usize> = filter_records(&catalog, &c)
            .iter()
            .map(|a| a.id.parse::<usize>().unwrap())
            .collect();
        prop_assert!(found.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn page_windows_partition_the_result(count in 0_usize..300, size in 1_usize..25) {
        let pages = total_pages(count, size);
        let mut next = 0;
        for page in 1..=pages {
            let w = PageWindow::compute(count, size, page).unwrap();
            prop_assert_eq!(w.range.start, next);
            prop_assert!(!w.is_empty() && w.len() <= size);
            prop_assert_eq!(w.has_prev(), page > 1);
            prop_assert_eq!(w.has_next(), page < pages);
            next = w.range.end;
        }
        prop_assert_eq!(next, count);
        prop_assert!(PageWindow::compute(count, size, pages.max(1) + 1).is_err());
    }

    #[test]
    fn paging_visits_each_filtered_record_once(
        catalog in records(),
        c in criteria(),
        size in 1_usize..8,
    ) {
        let expected = ids(&filter_records(&catalog, &c));
        let mut list = ListController::new(catalog, size).unwrap();
        list.apply(c);

        let mut seen = Vec::new();
        loop {
            seen.extend(list.view().items.iter().map(|a| a.id.clone()));
            if !list.next_page() {
                break;
            }
        }
        prop_assert_eq!(seen, expected);
    }
}
