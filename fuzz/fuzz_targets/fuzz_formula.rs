#![no_main]

use libfuzzer_sys::fuzz_target;

use smiter::isotopes::Composition;

fuzz_target!(|data: &[u8]| {
    let Ok(formula) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(composition) = Composition::parse(formula) {
        // Hill notation of a parsed formula parses to the same composition
        let hill = composition.hill_notation();
        if let Ok(reparsed) = Composition::parse(&format!("+{}", hill)) {
            assert_eq!(reparsed.monoisotopic_mass(), composition.monoisotopic_mass());
        }
    }
});
