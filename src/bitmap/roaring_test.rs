use super::*;

#[test]
fn test_add_and_iter() {
    let mut bm = Bitmap::new();
    for x in [0_u64, 1, 5, 1000, 1_000_000] {
        bm.add(x);
    }
    assert_eq!(bm.to_vec(), vec![0, 1, 5, 1000, 1_000_000]);
    assert_eq!(bm.cardinality(), 5);
}

#[test]
fn test_or_and_identity() {
    let mut a = Bitmap::new();
    a.add(1);
    a.add(3);
    let mut b = Bitmap::new();
    b.add(3);
    b.add(5);

    let or_ab = a.or(&b);
    assert_eq!(or_ab.to_vec(), vec![1, 3, 5]);

    let and_ab = a.and(&b);
    assert_eq!(and_ab.to_vec(), vec![3]);

    // reduce_or([A, A]) == A and reduce_and([A, A]) == A
    assert_eq!(Bitmap::reduce_or(&[a.clone(), a.clone()]).to_vec(), a.to_vec());
    assert_eq!(Bitmap::reduce_and(&[a.clone(), a.clone()]).to_vec(), a.to_vec());
}

#[test]
fn test_reduce_empty_list() {
    assert!(Bitmap::reduce_or(&[]).is_empty());
    assert!(Bitmap::reduce_and(&[]).is_empty());
}

#[test]
fn test_empty_neutral_for_or_absorbing_for_and() {
    let mut a = Bitmap::new();
    a.add(7);
    let empty = Bitmap::new();

    assert_eq!(a.or(&empty).to_vec(), vec![7]);
    assert!(a.and(&empty).is_empty());
}

#[test]
fn test_sparse_large_values() {
    let mut bm = Bitmap::new();
    bm.add(u32::MAX as u64 + 10);
    bm.add(u64::MAX - 1);
    assert_eq!(bm.cardinality(), 2);
    assert!(bm.contains(u64::MAX - 1));
}
